//! Lazy image collections.
//!
//! An [`ImageCollection`] is a description: shared source records plus the
//! filters and per-element steps queued against them. Nothing is computed
//! until [`ImageCollection::evaluate`] runs, so filtering and mapping are
//! cheap and never touch the source records.

use std::sync::Arc;


use super::harmonize::harmonize;
use super::indices::derive_indices;
use crate::error::PipelineResult;
use crate::models::{AreaOfInterest, DateRange, ImageryRecord};

/// Predicate over record metadata.
#[derive(Debug, Clone)]
pub enum Filter {
    /// Acquisition date inside the range.
    Date(DateRange),
    /// Record footprint intersects the area of interest.
    Bounds(AreaOfInterest),
}

impl Filter {
    pub fn accepts(&self, record: &ImageryRecord) -> bool {
        match self {
            Self::Date(range) => range.contains(record.acquired()),
            Self::Bounds(aoi) => aoi.intersects(&record.grid().bounds()),
        }
    }
}

/// Per-element transform.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Step {
    Harmonize,
    DeriveIndices,
}

impl Step {
    fn apply(self, record: &ImageryRecord) -> PipelineResult<ImageryRecord> {
        match self {
            Self::Harmonize => harmonize(record),
            Self::DeriveIndices => derive_indices(record),
        }
    }
}

#[derive(Debug, Clone)]
enum Op {
    Filter(Filter),
    Map(Step),
}

/// One source's records together with the operations queued against them.
#[derive(Debug, Clone)]
struct Part {
    records: Arc<Vec<ImageryRecord>>,
    ops: Vec<Op>,
}

/// Ordered-by-time, re-filterable set of imagery records.
#[derive(Debug, Clone, Default)]
pub struct ImageCollection {
    parts: Vec<Part>,
}

impl ImageCollection {
    pub fn new(records: Vec<ImageryRecord>) -> Self {
        Self::from_shared(Arc::new(records))
    }

    /// Collection over records already held elsewhere (e.g. a catalog).
    pub fn from_shared(records: Arc<Vec<ImageryRecord>>) -> Self {
        Self {
            parts: vec![Part {
                records,
                ops: Vec::new(),
            }],
        }
    }

    pub fn empty() -> Self {
        Self::default()
    }

    /// Number of source records before any filtering.
    pub fn source_len(&self) -> usize {
        self.parts.iter().map(|p| p.records.len()).sum()
    }

    fn push(&self, op: Op) -> Self {
        let mut next = self.clone();
        for part in &mut next.parts {
            part.ops.push(op.clone());
        }
        next
    }

    pub fn filter(&self, filter: Filter) -> Self {
        self.push(Op::Filter(filter))
    }

    pub fn filter_date(&self, range: DateRange) -> Self {
        self.filter(Filter::Date(range))
    }

    pub fn filter_bounds(&self, aoi: &AreaOfInterest) -> Self {
        self.filter(Filter::Bounds(aoi.clone()))
    }

    pub fn map(&self, step: Step) -> Self {
        self.push(Op::Map(step))
    }

    /// Union of both collections. Operations already queued on either side
    /// stay with their own elements.
    pub fn merge(&self, other: &ImageCollection) -> Self {
        let mut parts = self.parts.clone();
        parts.extend(other.parts.iter().cloned());
        Self { parts }
    }

    /// Run every queued operation and return the surviving records sorted by
    /// acquisition date (ties broken by id).
    pub fn evaluate(&self) -> PipelineResult<Vec<ImageryRecord>> {
        let mut out = Vec::new();
        for part in &self.parts {
            'records: for record in part.records.iter() {
                let mut current = record.clone();
                for op in &part.ops {
                    match op {
                        Op::Filter(filter) => {
                            if !filter.accepts(&current) {
                                continue 'records;
                            }
                        }
                        Op::Map(step) => current = step.apply(&current)?,
                    }
                }
                out.push(current);
            }
        }
        out.sort_by(|a, b| {
            a.acquired()
                .cmp(&b.acquired())
                .then_with(|| a.id().cmp(b.id()))
        });
        Ok(out)
    }
}
