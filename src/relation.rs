//! Lazily-evaluated relations over a record type.
//!
//! A [`Relation`] describes a filtered view of a [`RecordType`]'s records.
//! `filter` and `not` only record a clause; the records are materialized on
//! first read and memoized until [`Relation::reload`] or
//! [`Relation::invalidate`].
//!
//! When a relation is derived from a parent whose results are already
//! materialized, it filters from the parent's results instead of starting
//! over from the parent's candidates.

use std::cell::{Cell, RefCell};
use std::fmt;
use std::rc::Rc;

use rand::seq::SliceRandom;

use crate::error::{RelationError, RelationResult};
use crate::query::{sort_records, Clause, OrderSpec, Query};
use crate::record::{Record, RecordType};
use crate::value::FieldValue;

/// Records a relation filters from.
enum Candidates<'a, R> {
    /// The owner's full record set.
    All(&'a [R]),
    /// Materialized results of a parent relation.
    Scoped(Rc<[&'a R]>),
}

impl<R> Clone for Candidates<'_, R> {
    fn clone(&self) -> Self {
        match self {
            Candidates::All(records) => Candidates::All(*records),
            Candidates::Scoped(records) => Candidates::Scoped(Rc::clone(records)),
        }
    }
}

impl<R> Candidates<'_, R> {
    fn len(&self) -> usize {
        match self {
            Candidates::All(records) => records.len(),
            Candidates::Scoped(records) => records.len(),
        }
    }
}

/// A lazily-evaluated query over the records of `T`.
pub struct Relation<'a, T: RecordType> {
    owner: &'a T,
    candidates: Candidates<'a, T::Record>,
    /// Clauses not yet applied to `candidates`.
    pending: Vec<Clause>,
    /// Every clause applied since the owner's full set.
    description: Vec<Clause>,
    records: RefCell<Option<Rc<[&'a T::Record]>>>,
    dirty: Cell<bool>,
}

impl<T: RecordType> Clone for Relation<'_, T> {
    fn clone(&self) -> Self {
        Self {
            owner: self.owner,
            candidates: self.candidates.clone(),
            pending: self.pending.clone(),
            description: self.description.clone(),
            records: RefCell::new(self.records.borrow().clone()),
            dirty: Cell::new(self.dirty.get()),
        }
    }
}

impl<'a, T: RecordType> Relation<'a, T> {
    /// Unscoped relation over every record of `owner`.
    pub fn new(owner: &'a T) -> Self {
        Self {
            owner,
            candidates: Candidates::All(owner.records()),
            pending: Vec::new(),
            description: Vec::new(),
            records: RefCell::new(None),
            dirty: Cell::new(false),
        }
    }

    pub fn owner(&self) -> &'a T {
        self.owner
    }

    /// Clauses applied to reach this relation, `None` for an unfiltered one.
    pub fn query_description(&self) -> Option<&[Clause]> {
        if self.description.is_empty() {
            None
        } else {
            Some(&self.description)
        }
    }

    /// Number of records this relation filters from.
    pub fn candidate_count(&self) -> usize {
        self.candidates.len()
    }

    // ==================== Materialization ====================

    /// Materialized results if they are cached and clean.
    fn cached(&self) -> Option<Rc<[&'a T::Record]>> {
        if self.dirty.get() {
            return None;
        }
        self.records.borrow().clone()
    }

    fn records(&self) -> Rc<[&'a T::Record]> {
        match self.cached() {
            Some(records) => records,
            None => self.reload(),
        }
    }

    fn filter_candidates(&self) -> Rc<[&'a T::Record]> {
        let id_field = self.owner.id_field();
        let pending = &self.pending;
        let accepts =
            |record: &T::Record| pending.iter().all(|clause| clause.accepts(record, id_field));

        match &self.candidates {
            Candidates::All(records) => {
                let records: &'a [T::Record] = *records;
                records.iter().filter(|record| accepts(*record)).collect()
            }
            Candidates::Scoped(records) => records
                .iter()
                .copied()
                .filter(|record| accepts(*record))
                .collect(),
        }
    }

    /// Recompute the materialized records and clear the dirty flag.
    pub fn reload(&self) -> Rc<[&'a T::Record]> {
        let records = self.filter_candidates();
        tracing::debug!(
            "Materialized {} relation: {} of {} candidates",
            self.owner.type_name(),
            records.len(),
            self.candidates.len()
        );
        *self.records.borrow_mut() = Some(Rc::clone(&records));
        self.dirty.set(false);
        records
    }

    /// Mark the cached records stale so the next read recomputes them.
    pub fn invalidate(&self) {
        self.dirty.set(true);
    }

    pub fn is_materialized(&self) -> bool {
        self.cached().is_some()
    }

    // ==================== Filtering ====================

    /// Derive a relation with `clause` appended. Reuses this relation's
    /// results as candidates when they are already materialized.
    fn branch(&self, clause: Option<Clause>) -> Self {
        let mut description = self.description.clone();
        let (candidates, mut pending) = match self.cached() {
            Some(records) => (Candidates::Scoped(records), Vec::new()),
            None => (self.candidates.clone(), self.pending.clone()),
        };
        if let Some(clause) = clause {
            description.push(clause.clone());
            pending.push(clause);
        }

        Self {
            owner: self.owner,
            candidates,
            pending,
            description,
            records: RefCell::new(None),
            dirty: Cell::new(false),
        }
    }

    /// Records matching every condition of `query`.
    ///
    /// An empty query returns this relation unchanged.
    pub fn filter(&self, query: Query) -> Self {
        if query.is_empty() {
            return self.clone();
        }
        self.branch(Some(Clause {
            query,
            negated: false,
        }))
    }

    /// Records failing `query`.
    ///
    /// An empty query returns a fresh relation over the same records.
    pub fn not(&self, query: Query) -> Self {
        if query.is_empty() {
            return self.branch(None);
        }
        self.branch(Some(Clause {
            query,
            negated: true,
        }))
    }

    pub fn all(&self) -> Self {
        self.filter(Query::new())
    }

    // ==================== Lookup ====================

    pub fn find_by(&self, query: Query) -> Option<&'a T::Record> {
        self.filter(query).first()
    }

    /// Like [`Relation::find_by`], but a miss is an error.
    pub fn find_by_strict(&self, query: Query) -> RelationResult<&'a T::Record> {
        self.find_by(query)
            .ok_or_else(|| RelationError::not_found(self.owner.type_name()))
    }

    /// Find a record by identifier.
    pub fn find(&self, id: impl Into<FieldValue>) -> RelationResult<&'a T::Record> {
        let id = id.into();
        if id.is_null() {
            return Err(RelationError::not_found_without_id(self.owner.type_name()));
        }
        if let FieldValue::List(_) = id {
            return Err(RelationError::ArgumentError(
                "find takes a single ID, use find_many for several".to_string(),
            ));
        }
        match self.find_by_id(id.clone()) {
            Some(record) => Ok(record),
            None => Err(RelationError::not_found_with_id(
                self.owner.type_name(),
                id,
            )),
        }
    }

    /// Find every identifier in order, stopping at the first miss.
    pub fn find_many<I, V>(&self, ids: I) -> RelationResult<Vec<&'a T::Record>>
    where
        I: IntoIterator<Item = V>,
        V: Into<FieldValue>,
    {
        ids.into_iter().map(|id| self.find(id)).collect()
    }

    /// First materialized record satisfying `predicate`.
    pub fn find_where<P>(&self, mut predicate: P) -> Option<&'a T::Record>
    where
        P: FnMut(&T::Record) -> bool,
    {
        self.records()
            .iter()
            .copied()
            .find(|record| predicate(*record))
    }

    /// Identifier lookup. Unscoped relations use the owner's index; scoped
    /// ones scan, since the index covers the full record set.
    pub fn find_by_id(&self, id: impl Into<FieldValue>) -> Option<&'a T::Record> {
        let id = id.into();
        if self.is_scoped() {
            tracing::trace!("{}: scanning scoped relation for ID={}", self.owner.type_name(), id);
            self.find_by(Query::new().eq(self.owner.id_field(), id))
        } else {
            tracing::trace!("{}: index lookup for ID={}", self.owner.type_name(), id);
            self.owner.find_using_index(&id)
        }
    }

    /// Whether filtering narrowed this relation below the owner's full set.
    pub fn is_scoped(&self) -> bool {
        self.len() != self.owner.records().len()
    }

    // ==================== Projection ====================

    /// Field values of every record.
    ///
    /// One field gives a flat list of values. Several fields give one
    /// `FieldValue::List` per record, in field order. No fields give nothing.
    pub fn pluck(&self, fields: &[&str]) -> Vec<FieldValue> {
        let records = self.all().records();
        match fields {
            [] => Vec::new(),
            [field] => records.iter().map(|record| record.get(field)).collect(),
            _ => records
                .iter()
                .map(|record| {
                    FieldValue::List(fields.iter().map(|field| record.get(field)).collect())
                })
                .collect(),
        }
    }

    pub fn pick(&self, fields: &[&str]) -> Option<FieldValue> {
        self.pluck(fields).into_iter().next()
    }

    // ==================== Ordering ====================

    /// Records sorted by `spec`, first key most significant.
    ///
    /// Returns a plain sequence rather than a relation.
    pub fn order(&self, spec: impl Into<OrderSpec>) -> RelationResult<Vec<&'a T::Record>> {
        let terms = spec.into().terms()?;
        let mut records = self.all().to_vec();
        sort_records(&mut records, &terms)?;
        tracing::debug!(
            "Ordered {} {} records by {} keys",
            records.len(),
            self.owner.type_name(),
            terms.len()
        );
        Ok(records)
    }

    // ==================== Sequence access ====================

    pub fn iter(&self) -> Iter<'a, T::Record> {
        let records = self.records();
        let back = records.len();
        Iter {
            records,
            front: 0,
            back,
        }
    }

    pub fn to_vec(&self) -> Vec<&'a T::Record> {
        self.records().to_vec()
    }

    pub fn len(&self) -> usize {
        self.records().len()
    }

    pub fn count(&self) -> usize {
        self.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn get(&self, index: usize) -> Option<&'a T::Record> {
        self.records().get(index).copied()
    }

    pub fn first(&self) -> Option<&'a T::Record> {
        self.get(0)
    }

    pub fn second(&self) -> Option<&'a T::Record> {
        self.get(1)
    }

    pub fn third(&self) -> Option<&'a T::Record> {
        self.get(2)
    }

    pub fn last(&self) -> Option<&'a T::Record> {
        self.records().last().copied()
    }

    /// A uniformly random record.
    pub fn sample(&self) -> Option<&'a T::Record> {
        self.records().choose(&mut rand::thread_rng()).copied()
    }
}

/// Iterator over a relation's materialized records.
pub struct Iter<'a, R> {
    records: Rc<[&'a R]>,
    front: usize,
    back: usize,
}

impl<'a, R> Iterator for Iter<'a, R> {
    type Item = &'a R;

    fn next(&mut self) -> Option<&'a R> {
        if self.front >= self.back {
            return None;
        }
        let record = self.records[self.front];
        self.front += 1;
        Some(record)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = self.back - self.front;
        (remaining, Some(remaining))
    }
}

impl<R> DoubleEndedIterator for Iter<'_, R> {
    fn next_back(&mut self) -> Option<Self::Item> {
        if self.front >= self.back {
            return None;
        }
        self.back -= 1;
        Some(self.records[self.back])
    }
}

impl<R> ExactSizeIterator for Iter<'_, R> {}

impl<'a, T: RecordType> IntoIterator for &Relation<'a, T> {
    type Item = &'a T::Record;
    type IntoIter = Iter<'a, T::Record>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

impl<T: RecordType> PartialEq for Relation<'_, T>
where
    T::Record: PartialEq,
{
    fn eq(&self, other: &Self) -> bool {
        self.records() == other.records()
    }
}

impl<'a, T: RecordType> PartialEq<[&'a T::Record]> for Relation<'a, T>
where
    T::Record: PartialEq,
{
    fn eq(&self, other: &[&'a T::Record]) -> bool {
        *self.records() == *other
    }
}

impl<'a, T: RecordType> PartialEq<Vec<&'a T::Record>> for Relation<'a, T>
where
    T::Record: PartialEq,
{
    fn eq(&self, other: &Vec<&'a T::Record>) -> bool {
        *self.records() == **other
    }
}

impl<T: RecordType> fmt::Debug for Relation<'_, T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let query = self
            .description
            .iter()
            .map(ToString::to_string)
            .collect::<Vec<_>>()
            .join(" AND ");
        f.debug_struct("Relation")
            .field("type", &self.owner.type_name())
            .field("query", &query)
            .field("candidates", &self.candidates.len())
            .field("materialized", &self.cached().map(|records| records.len()))
            .finish()
    }
}
