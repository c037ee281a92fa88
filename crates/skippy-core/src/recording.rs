// SPDX-FileCopyrightText: 2026 Skippy Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Metric registration and recording helpers.
//!
//! Uses the metrics-rs facade; without an installed recorder every call is a no-op.

use metrics::describe_counter;

/// Register descriptions for every Skippy counter.
pub fn register_metrics() {
    describe_counter!("skippy_facts_inserted_total", "Facts stored as new rows");
    describe_counter!(
        "skippy_facts_reinforced_total",
        "Facts reinforced by a restatement"
    );
    describe_counter!("skippy_people_created_total", "Person records created");
    describe_counter!("skippy_people_merged_total", "Person merges committed");
    describe_counter!(
        "skippy_evaluation_failures_total",
        "Turn evaluations that ended in an error"
    );
}

/// Record the outcome of a fact upsert.
pub fn record_fact_upsert(was_new: bool) {
    if was_new {
        metrics::counter!("skippy_facts_inserted_total").increment(1);
    } else {
        metrics::counter!("skippy_facts_reinforced_total").increment(1);
    }
}

pub fn record_person_created() {
    metrics::counter!("skippy_people_created_total").increment(1);
}

pub fn record_person_merged() {
    metrics::counter!("skippy_people_merged_total").increment(1);
}

/// Record a failed evaluation, labelled by whether the error was transient.
pub fn record_evaluation_failure(transient: bool) {
    metrics::counter!(
        "skippy_evaluation_failures_total",
        "transient" => if transient { "true" } else { "false" }
    )
    .increment(1);
}
