//! Range compiler - turns cursors into backend filters and sort orders.
//!
//! # Boundaries on a non-unique sort key
//!
//! A cursor points at a record by `(sort value, id)`. "Strictly after" that
//! record means either a strictly greater sort value (in the paging
//! direction), or the same sort value and a greater id. The tie clause is only
//! added when more than one record in the base filter shares the value.
//!
//! Ties always break on the id ascending for `after` and descending for
//! `before`, whatever the primary direction, matching the secondary sort key.
//!
//! ```text
//! after  (asc):  field > v  OR (field = v AND id > cid)
//! after  (desc): field < v  OR (field = v AND id > cid)
//! before (asc):  field < v  OR (field = v AND id < cid)
//! before (desc): field > v  OR (field = v AND id < cid)
//! ```
//!
//! Missing and null sort values rank below every other value, so
//! `field < v` also keeps them, and a cursor on a null value compiles to:
//!
//! ```text
//! field > null:  field IS NOT NULL
//! field < null:  FALSE
//! field = null:  field IS NULL
//! ```

use futures::try_join;
use serde_json::Value;
use tracing::{debug, trace};

use crate::codec::CursorPosition;
use crate::error::StorageResult;
use crate::ports::{CompareOp, DataSource, Filter, OrderDirection, Sort, SortKey};

/// Which side of the page a cursor bounds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Boundary {
    /// Keep records strictly after the cursor.
    After,
    /// Keep records strictly before the cursor.
    Before,
}

impl Boundary {
    fn strict_op(self, direction: OrderDirection) -> CompareOp {
        match (self, direction) {
            (Boundary::After, OrderDirection::Asc) | (Boundary::Before, OrderDirection::Desc) => {
                CompareOp::Gt
            }
            (Boundary::After, OrderDirection::Desc) | (Boundary::Before, OrderDirection::Asc) => {
                CompareOp::Lt
            }
        }
    }

    fn tie_op(self) -> CompareOp {
        match self {
            Boundary::After => CompareOp::Gt,
            Boundary::Before => CompareOp::Lt,
        }
    }
}

/// Ordering configuration of one resolution.
#[derive(Debug, Clone, Copy)]
pub struct SortSpec<'a> {
    /// Dotted path of the (possibly non-unique) sort field.
    pub sort_field: &'a str,
    /// Dotted path of the unique id field.
    pub id_field: &'a str,
    pub direction: OrderDirection,
}

impl SortSpec<'_> {
    /// Whether the sort field is the unique id itself.
    pub fn sorts_by_id(&self) -> bool {
        self.sort_field == self.id_field
    }

    /// Filter keeping records strictly past `position` on the given side.
    ///
    /// `tie_count` is the number of records sharing the cursor's sort value
    /// (only whether it exceeds one matters). A position without a field
    /// value places no constraint.
    pub fn boundary_filter(
        &self,
        boundary: Boundary,
        position: &CursorPosition,
        tie_count: u64,
    ) -> Filter {
        let Some(field) = &position.field else {
            return Filter::all();
        };

        let strict = self.beyond(boundary.strict_op(self.direction), field);

        match &position.id {
            Some(id) if tie_count > 1 => Filter::or([
                Filter::and([
                    self.same_value(field),
                    Filter::compare(self.id_field, boundary.tie_op(), id.clone()),
                ]),
                strict,
            ]),
            _ => strict,
        }
    }

    /// Sort value strictly greater (`Gt`) or smaller (`Lt`) than `value`.
    fn beyond(&self, op: CompareOp, value: &Value) -> Filter {
        match (op, value.is_null()) {
            (CompareOp::Gt, true) => Filter::exists(self.sort_field),
            (_, true) => Filter::none(),
            (CompareOp::Lt, false) => Filter::or([
                Filter::lt(self.sort_field, value.clone()),
                Filter::missing(self.sort_field),
            ]),
            (op, false) => Filter::compare(self.sort_field, op, value.clone()),
        }
    }

    /// Sort value equal to `value`.
    fn same_value(&self, value: &Value) -> Filter {
        if value.is_null() {
            Filter::missing(self.sort_field)
        } else {
            Filter::eq(self.sort_field, value.clone())
        }
    }

    /// Two-key sort giving a total order, inverted for backward reads.
    pub fn sort(&self, backward: bool) -> Sort {
        let mut keys = vec![SortKey::new(self.sort_field, self.direction)];
        if !self.sorts_by_id() {
            keys.push(SortKey::new(self.id_field, OrderDirection::Asc));
        }
        let sort = Sort::new(keys);
        if backward { sort.reversed() } else { sort }
    }
}

/// Backend-ready filter and sort for one page.
#[derive(Debug, Clone, PartialEq)]
pub struct CompiledRange {
    /// Base filter AND the cursor boundaries.
    pub filter: Filter,
    pub sort: Sort,
}

/// Compiles cursor boundaries against a base filter.
pub struct RangeCompiler<'a> {
    spec: SortSpec<'a>,
    base_filter: &'a Filter,
}

impl<'a> RangeCompiler<'a> {
    pub fn new(spec: SortSpec<'a>, base_filter: &'a Filter) -> Self {
        Self { spec, base_filter }
    }

    /// Build the range for the given decoded cursors.
    ///
    /// Counts ties on each cursor's sort value (concurrently), then combines
    /// the base filter with both boundaries.
    pub async fn compile<D>(
        &self,
        source: &D,
        after: Option<&CursorPosition>,
        before: Option<&CursorPosition>,
        backward: bool,
    ) -> StorageResult<CompiledRange>
    where
        D: DataSource + ?Sized,
    {
        let (after_ties, before_ties) =
            try_join!(self.tie_count(source, after), self.tie_count(source, before))?;

        let after_filter = after
            .map(|position| self.spec.boundary_filter(Boundary::After, position, after_ties))
            .unwrap_or_default();
        let before_filter = before
            .map(|position| self.spec.boundary_filter(Boundary::Before, position, before_ties))
            .unwrap_or_default();

        trace!(after = %after_filter, before = %before_filter, "Cursor boundaries");

        let filter = Filter::and([self.base_filter.clone(), after_filter, before_filter]);
        let sort = self.spec.sort(backward);

        debug!(filter = %filter, backward, "Range compiled");

        Ok(CompiledRange { filter, sort })
    }

    /// Number of records (capped at 2) sharing the cursor's sort value.
    async fn tie_count<D>(&self, source: &D, position: Option<&CursorPosition>) -> StorageResult<u64>
    where
        D: DataSource + ?Sized,
    {
        let Some(field) = position.and_then(|p| p.field.as_ref()) else {
            return Ok(0);
        };
        if self.spec.sorts_by_id() {
            return Ok(1);
        }
        let ties = Filter::and([self.base_filter.clone(), self.spec.same_value(field)]);
        source.count(&ties, Some(2)).await
    }
}
