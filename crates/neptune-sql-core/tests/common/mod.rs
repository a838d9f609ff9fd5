#![allow(dead_code)]

use std::sync::Arc;

use neptune_sql_core::events::CollectorSink;
use neptune_sql_core::{DebugDriver, DriverRegistry, Query, QueryError, QueryFactory};

/// Factory with one debug driver registered as `debug`, and the sink it reports to.
pub fn debug_factory() -> (QueryFactory, Arc<CollectorSink>) {
    let sink = Arc::new(CollectorSink::default());
    let mut drivers = DriverRegistry::new();
    drivers.register("debug", Arc::new(DebugDriver::with_sink(sink.clone())));
    (QueryFactory::new(drivers), sink)
}

pub fn factory() -> QueryFactory {
    debug_factory().0
}

pub fn select() -> Query {
    factory()
        .select()
        .unwrap_or_else(|e| panic!("Failed to create SELECT: {e}"))
}

pub fn insert() -> Query {
    factory()
        .insert()
        .unwrap_or_else(|e| panic!("Failed to create INSERT: {e}"))
}

pub fn update() -> Query {
    factory()
        .update()
        .unwrap_or_else(|e| panic!("Failed to create UPDATE: {e}"))
}

pub fn delete() -> Query {
    factory()
        .delete()
        .unwrap_or_else(|e| panic!("Failed to create DELETE: {e}"))
}

pub fn sql(query: &Query) -> String {
    query
        .to_sql()
        .unwrap_or_else(|e| panic!("Failed to format {query:?}\nError: {e}"))
}

pub fn sql_err(query: &Query) -> QueryError {
    query
        .to_sql()
        .expect_err(&format!("Expected formatting error for {query:?}"))
}
