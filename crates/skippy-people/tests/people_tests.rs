// SPDX-FileCopyrightText: 2026 Skippy Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Integration tests for identity resolution, merges, and importance.

use std::sync::Arc;

use chrono::{Duration, Utc};

use skippy_config::model::{AmbiguousPolicy, IdentityConfig, ImportanceConfig};
use skippy_core::{PersonMention, SkippyError};
use skippy_people::{
    IdentityResolver, ImportanceScorer, MAX_REDIRECTS, MatchTier, PersonStatus, follow_absorbed,
};
use skippy_storage::Database;

async fn setup() -> (Database, IdentityResolver, ImportanceScorer) {
    let db = Database::open_in_memory().await.unwrap();
    let resolver = IdentityResolver::new(
        db.clone(),
        IdentityConfig::default(),
        ImportanceConfig::default(),
    );
    let scorer = ImportanceScorer::new(db.clone(), ImportanceConfig::default());
    (db, resolver, scorer)
}

fn mention(name: &str) -> PersonMention {
    PersonMention {
        name: name.to_string(),
        phone: None,
        email: None,
    }
}

async fn insert_fact(db: &Database, id: &str, person_ref: &str) {
    let id = id.to_string();
    let person_ref = person_ref.to_string();
    db.connection()
        .call(move |conn| -> Result<(), rusqlite::Error> {
            conn.execute(
                "INSERT INTO facts (id, owner_id, text, embedding, confidence, person_ref, created_at, updated_at) \
                 VALUES (?1, 'owner', 'fact', x'0000803f', 0.5, ?2, '2026-01-01T00:00:00.000Z', '2026-01-01T00:00:00.000Z')",
                rusqlite::params![id, person_ref],
            )?;
            Ok(())
        })
        .await
        .unwrap();
}

/// Insert `p0 <- p1 <- ... <- p{hops}`: every `p{i}` for `i < hops` is
/// absorbed into `p{i+1}`, which leaves `p{hops}` active.
async fn insert_chain(db: &Database, hops: usize) {
    db.connection()
        .call(move |conn| -> Result<(), rusqlite::Error> {
            let tx = conn.transaction()?;
            for i in (0..=hops).rev() {
                let (status, next) = if i == hops {
                    ("active", None)
                } else {
                    ("absorbed", Some(format!("p{}", i + 1)))
                };
                tx.execute(
                    "INSERT INTO people (id, owner_id, canonical_name, status, absorbed_into, last_mentioned, created_at, updated_at) \
                     VALUES (?1, 'owner', ?1, ?2, ?3, '2026-01-01T00:00:00.000Z', '2026-01-01T00:00:00.000Z', '2026-01-01T00:00:00.000Z')",
                    rusqlite::params![format!("p{i}"), status, next],
                )?;
            }
            tx.commit()
        })
        .await
        .unwrap();
}

async fn fact_person_ref(db: &Database, id: &str) -> Option<String> {
    let id = id.to_string();
    db.connection()
        .call(move |conn| {
            conn.query_row(
                "SELECT person_ref FROM facts WHERE id = ?1",
                rusqlite::params![id],
                |row| row.get(0),
            )
        })
        .await
        .unwrap()
}

#[tokio::test]
async fn new_person_starts_at_baseline() {
    let (_db, resolver, _) = setup().await;
    let person = resolver
        .create_person("owner", "Summer Hollars", None, None)
        .await
        .unwrap();
    assert_eq!(person.importance_score, 25.0);
    assert_eq!(person.mention_count, 1);
    assert_eq!(person.status, PersonStatus::Active);
}

#[tokio::test]
async fn empty_canonical_name_is_rejected() {
    let (_db, resolver, _) = setup().await;
    let err = resolver
        .create_person("owner", "   ", None, None)
        .await
        .unwrap_err();
    assert!(matches!(err, SkippyError::InvalidInput(_)));
}

#[tokio::test]
async fn first_name_auto_links_to_full_name() {
    let (_db, resolver, _) = setup().await;
    let summer = resolver
        .create_person("owner", "Summer Hollars", None, None)
        .await
        .unwrap();

    let resolution = resolver.resolve("owner", "Summer", None, None).await.unwrap();
    assert_eq!(resolution.tier, MatchTier::FuzzyHigh);
    assert_eq!(resolution.linked_person(), Some(summer.id.as_str()));
}

#[tokio::test]
async fn fuzzy_high_link_learns_the_spelling() {
    let (_db, resolver, _) = setup().await;
    let summer = resolver
        .create_person("owner", "Summer Hollars", None, None)
        .await
        .unwrap();

    let linked = resolver
        .resolve_or_create("owner", &mention("Summer"), AmbiguousPolicy::Skip)
        .await
        .unwrap();
    assert_eq!(linked.resolution.tier, MatchTier::FuzzyHigh);
    assert_eq!(linked.person_id.as_deref(), Some(summer.id.as_str()));
    let learned = resolver.get(&summer.id).await.unwrap().unwrap();
    assert_eq!(learned.aliases, vec!["Summer".to_string()]);

    let again = resolver
        .resolve_or_create("owner", &mention("  SUMMER "), AmbiguousPolicy::Skip)
        .await
        .unwrap();
    assert_eq!(again.resolution.tier, MatchTier::ExactName);
    let unchanged = resolver.get(&summer.id).await.unwrap().unwrap();
    assert_eq!(unchanged.aliases.len(), 1);
}

#[tokio::test]
async fn fuzzy_low_link_does_not_learn_the_spelling() {
    let (_db, resolver, _) = setup().await;
    let matthew = resolver
        .create_person("owner", "Matthew", None, None)
        .await
        .unwrap();

    resolver
        .resolve_or_create("owner", &mention("Matt"), AmbiguousPolicy::Link)
        .await
        .unwrap();
    let person = resolver.get(&matthew.id).await.unwrap().unwrap();
    assert!(person.aliases.is_empty());
}

#[tokio::test]
async fn exact_phone_wins_over_name() {
    let (_db, resolver, _) = setup().await;
    let summer = resolver
        .create_person("owner", "Summer Hollars", Some("555-010-2233"), None)
        .await
        .unwrap();

    let resolution = resolver
        .resolve("owner", "Completely Different", Some("(555) 010 2233"), None)
        .await
        .unwrap();
    assert_eq!(resolution.tier, MatchTier::ExactPhone);
    assert_eq!(resolution.person_id, Some(summer.id));
}

#[tokio::test]
async fn fuzzy_low_is_suggested_but_not_linked() {
    let (_db, resolver, _) = setup().await;
    resolver
        .create_person("owner", "Matthew", None, None)
        .await
        .unwrap();

    let resolved = resolver
        .resolve_or_create("owner", &mention("Matt"), AmbiguousPolicy::Skip)
        .await
        .unwrap();
    assert_eq!(resolved.resolution.tier, MatchTier::FuzzyLow);
    assert!(resolved.resolution.person_id.is_some());
    assert!(resolved.person_id.is_none());
    assert!(!resolved.created);
}

#[tokio::test]
async fn ambiguous_policy_link_and_create() {
    let (_db, resolver, _) = setup().await;
    let matthew = resolver
        .create_person("owner", "Matthew", None, None)
        .await
        .unwrap();

    let linked = resolver
        .resolve_or_create("owner", &mention("Matt"), AmbiguousPolicy::Link)
        .await
        .unwrap();
    assert_eq!(linked.person_id.as_deref(), Some(matthew.id.as_str()));

    let created = resolver
        .resolve_or_create("owner", &mention("Matt"), AmbiguousPolicy::Create)
        .await
        .unwrap();
    assert!(created.created);
    assert_ne!(created.person_id.as_deref(), Some(matthew.id.as_str()));
}

#[tokio::test]
async fn people_are_scoped_per_owner() {
    let (_db, resolver, _) = setup().await;
    resolver
        .create_person("owner-a", "Summer Hollars", None, None)
        .await
        .unwrap();
    let resolution = resolver
        .resolve("owner-b", "Summer Hollars", None, None)
        .await
        .unwrap();
    assert_eq!(resolution.tier, MatchTier::NoMatch);
}

#[tokio::test]
async fn concurrent_first_mentions_create_one_person() {
    let (_db, resolver, _) = setup().await;
    let resolver = Arc::new(resolver);

    let mut tasks = tokio::task::JoinSet::new();
    for _ in 0..8 {
        let resolver = Arc::clone(&resolver);
        tasks.spawn(async move {
            resolver
                .resolve_or_create("owner", &mention("Jordan Lee"), AmbiguousPolicy::Skip)
                .await
                .unwrap()
        });
    }
    let mut created = 0;
    while let Some(result) = tasks.join_next().await {
        if result.unwrap().created {
            created += 1;
        }
    }
    assert_eq!(created, 1);

    let people = resolver.list_people("owner", Utc::now()).await.unwrap();
    assert_eq!(people.len(), 1);
}

#[tokio::test]
async fn merge_repoints_facts_and_absorbs() {
    let (db, resolver, _) = setup().await;
    let a = resolver
        .create_person("owner", "Summer Hollars", None, None)
        .await
        .unwrap();
    let b = resolver
        .create_person("owner", "Sunny", None, Some("sunny@example.com"))
        .await
        .unwrap();
    insert_fact(&db, "f1", &b.id).await;
    insert_fact(&db, "f2", &b.id).await;
    insert_fact(&db, "f3", &a.id).await;

    let outcome = resolver.merge(&a.id, &b.id).await.unwrap();
    assert_eq!(outcome.facts_repointed, 2);
    assert!(outcome.survivor.merged_from.contains(&b.id));
    assert!(outcome.survivor.aliases.contains(&"Sunny".to_string()));
    assert_eq!(outcome.survivor.email.as_deref(), Some("sunny@example.com"));
    assert_eq!(outcome.survivor.mention_count, 2);
    assert_eq!(outcome.survivor.importance_score, 35.0);

    for fact in ["f1", "f2", "f3"] {
        assert_eq!(fact_person_ref(&db, fact).await.as_deref(), Some(a.id.as_str()));
    }

    let absorbed = resolver.get(&b.id).await.unwrap().unwrap();
    assert_eq!(absorbed.status, PersonStatus::Absorbed);
    assert_eq!(absorbed.absorbed_into.as_deref(), Some(a.id.as_str()));

    // The absorbed name now resolves to the survivor, never to B.
    let resolution = resolver.resolve("owner", "Sunny", None, None).await.unwrap();
    assert_eq!(resolution.tier, MatchTier::ExactName);
    assert_eq!(resolution.person_id.as_deref(), Some(a.id.as_str()));
}

#[tokio::test]
async fn merge_conflicts() {
    let (_db, resolver, _) = setup().await;
    let a = resolver.create_person("owner", "Ann", None, None).await.unwrap();
    let b = resolver.create_person("owner", "Bea", None, None).await.unwrap();
    let c = resolver.create_person("owner", "Cal", None, None).await.unwrap();

    let err = resolver.merge(&a.id, &a.id).await.unwrap_err();
    assert!(matches!(err, SkippyError::MergeConflict { .. }));

    resolver.merge(&a.id, &b.id).await.unwrap();
    let err = resolver.merge(&c.id, &b.id).await.unwrap_err();
    assert!(matches!(err, SkippyError::MergeConflict { .. }));
    let err = resolver.merge(&b.id, &c.id).await.unwrap_err();
    assert!(matches!(err, SkippyError::MergeConflict { .. }));

    let err = resolver.merge(&a.id, "missing").await.unwrap_err();
    assert!(matches!(err, SkippyError::NotFound { .. }));

    // A failed merge leaves C untouched.
    let c_after = resolver.get(&c.id).await.unwrap().unwrap();
    assert_eq!(c_after, c);
}

#[tokio::test]
async fn merge_across_owners_is_rejected() {
    let (_db, resolver, _) = setup().await;
    let a = resolver.create_person("owner-a", "Ann", None, None).await.unwrap();
    let b = resolver.create_person("owner-b", "Ann", None, None).await.unwrap();
    let err = resolver.merge(&a.id, &b.id).await.unwrap_err();
    assert!(matches!(err, SkippyError::MergeConflict { .. }));
}

#[tokio::test]
async fn bump_raises_score_and_count() {
    let (_db, resolver, scorer) = setup().await;
    let p = resolver.create_person("owner", "Ann", None, None).await.unwrap();
    let now = Utc::now();

    let bumped = scorer.bump_at(&p.id, now).await.unwrap();
    assert_eq!(bumped.importance_score, 30.0);
    assert_eq!(bumped.mention_count, 2);

    let decayed = scorer.decayed(&p.id, now + Duration::days(30)).await.unwrap();
    assert!((decayed - 15.0).abs() < 1e-6, "got {decayed}");
}

#[tokio::test]
async fn bump_is_capped_at_max_score() {
    let (_db, resolver, scorer) = setup().await;
    let p = resolver.create_person("owner", "Ann", None, None).await.unwrap();
    let now = Utc::now();
    for _ in 0..30 {
        scorer.bump_at(&p.id, now).await.unwrap();
    }
    let person = resolver.get(&p.id).await.unwrap().unwrap();
    assert_eq!(person.importance_score, 100.0);
    assert_eq!(person.mention_count, 31);
}

#[tokio::test]
async fn bump_of_absorbed_person_lands_on_survivor() {
    let (_db, resolver, scorer) = setup().await;
    let a = resolver.create_person("owner", "Ann", None, None).await.unwrap();
    let b = resolver.create_person("owner", "Annie", None, None).await.unwrap();
    resolver.merge(&a.id, &b.id).await.unwrap();

    let bumped = scorer.bump(&b.id).await.unwrap();
    assert_eq!(bumped.id, a.id);
    assert_eq!(bumped.mention_count, 3);
}

#[tokio::test]
async fn redirect_chain_is_followed_up_to_the_limit() {
    let (db, _resolver, scorer) = setup().await;
    insert_chain(&db, MAX_REDIRECTS).await;

    let end = db
        .connection()
        .call(|conn| follow_absorbed(conn, "p0"))
        .await
        .unwrap()
        .unwrap();
    assert_eq!(end.id, format!("p{MAX_REDIRECTS}"));

    let bumped = scorer.bump("p0").await.unwrap();
    assert_eq!(bumped.id, format!("p{MAX_REDIRECTS}"));
    assert_eq!(bumped.mention_count, 2);
}

#[tokio::test]
async fn redirect_chain_past_the_limit_is_rejected() {
    let (db, _resolver, scorer) = setup().await;
    insert_chain(&db, MAX_REDIRECTS + 1).await;

    let found = db
        .connection()
        .call(|conn| follow_absorbed(conn, "p0"))
        .await
        .unwrap();
    assert!(matches!(found, Err(SkippyError::Internal(_))));
    assert!(scorer.bump("p0").await.is_err());
    assert!(scorer.bump("p1").await.is_ok());
}

#[tokio::test]
async fn bump_unknown_person_is_not_found() {
    let (_db, _resolver, scorer) = setup().await;
    let err = scorer.bump("nobody").await.unwrap_err();
    assert!(matches!(err, SkippyError::NotFound { .. }));
}

#[tokio::test]
async fn list_people_orders_by_decayed_importance() {
    let (_db, resolver, scorer) = setup().await;
    let quiet = resolver.create_person("owner", "Quiet", None, None).await.unwrap();
    let busy = resolver.create_person("owner", "Busy", None, None).await.unwrap();
    let now = Utc::now();
    scorer.bump_at(&busy.id, now).await.unwrap();
    scorer.bump_at(&busy.id, now).await.unwrap();

    let ranked = resolver.list_people("owner", now).await.unwrap();
    assert_eq!(ranked[0].person.id, busy.id);
    assert_eq!(ranked[1].person.id, quiet.id);
    assert!(ranked[0].decayed_score > ranked[1].decayed_score);
}

#[tokio::test]
async fn alias_maintenance() {
    let (_db, resolver, _) = setup().await;
    let p = resolver
        .create_person("owner", "Robert Smith", None, None)
        .await
        .unwrap();

    let p = resolver.add_alias(&p.id, "Bobby").await.unwrap();
    let p = resolver.add_alias(&p.id, "bobby").await.unwrap();
    assert_eq!(p.aliases, vec!["Bobby".to_string()]);

    let resolution = resolver.resolve("owner", "BOBBY", None, None).await.unwrap();
    assert_eq!(resolution.tier, MatchTier::ExactName);

    let p = resolver.remove_alias(&p.id, "BOBBY").await.unwrap();
    assert!(p.aliases.is_empty());
}

#[tokio::test]
async fn duplicates_by_email() {
    let (_db, resolver, _) = setup().await;
    resolver
        .create_person("owner", "Summer Hollars", None, Some("summer@example.com"))
        .await
        .unwrap();
    resolver
        .create_person("owner", "S. H.", None, Some("SUMMER@example.com"))
        .await
        .unwrap();
    resolver.create_person("owner", "Nolan", None, None).await.unwrap();

    let clusters = resolver.find_duplicates("owner", 90.0).await.unwrap();
    assert_eq!(clusters.len(), 1);
    assert_eq!(clusters[0].people.len(), 2);
    assert_eq!(clusters[0].people[0].canonical_name, "Summer Hollars");
}
