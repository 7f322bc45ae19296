use std::cmp::Ordering;

use bson::{Bson, Document};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FilterOp {
    Eq,
    Ne,
    Gt,
    Gte,
    Lt,
    Lte,
}

impl FilterOp {
    fn operator(&self) -> &'static str {
        match self {
            FilterOp::Eq => "$eq",
            FilterOp::Ne => "$ne",
            FilterOp::Gt => "$gt",
            FilterOp::Gte => "$gte",
            FilterOp::Lt => "$lt",
            FilterOp::Lte => "$lte",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Filter {
    pub field: String,
    pub op: FilterOp,
    pub value: Bson,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortOrder {
    Ascending,
    Descending,
}

/// A single-collection query: ANDed predicates, an ordering and an optional cap.
///
/// Both store backends consume the same value, so a feed behaves identically
/// against MongoDB and the in-memory store.
#[derive(Debug, Clone, PartialEq)]
pub struct Query {
    pub collection: String,
    pub filters: Vec<Filter>,
    pub sort: Vec<(String, SortOrder)>,
    pub limit: Option<i64>,
}

impl Query {
    pub fn new(collection: &str) -> Self {
        Self {
            collection: collection.to_string(),
            filters: Vec::new(),
            sort: Vec::new(),
            limit: None,
        }
    }

    pub fn filter(mut self, field: &str, op: FilterOp, value: impl Into<Bson>) -> Self {
        self.filters.push(Filter {
            field: field.to_string(),
            op,
            value: value.into(),
        });
        self
    }

    pub fn eq(self, field: &str, value: impl Into<Bson>) -> Self {
        self.filter(field, FilterOp::Eq, value)
    }

    pub fn gte(self, field: &str, value: impl Into<Bson>) -> Self {
        self.filter(field, FilterOp::Gte, value)
    }

    pub fn lt(self, field: &str, value: impl Into<Bson>) -> Self {
        self.filter(field, FilterOp::Lt, value)
    }

    pub fn sort_asc(mut self, field: &str) -> Self {
        self.sort.push((field.to_string(), SortOrder::Ascending));
        self
    }

    pub fn sort_desc(mut self, field: &str) -> Self {
        self.sort.push((field.to_string(), SortOrder::Descending));
        self
    }

    pub fn limit(mut self, limit: i64) -> Self {
        self.limit = Some(limit);
        self
    }

    /// MongoDB filter document. Equality stays in shorthand form so that
    /// `{ field: null }` keeps matching missing fields.
    pub fn filter_document(&self) -> Document {
        let mut filter = Document::new();
        for f in &self.filters {
            if f.op == FilterOp::Eq {
                filter.insert(f.field.clone(), f.value.clone());
                continue;
            }
            match filter.get_document_mut(&f.field) {
                Ok(ops) => {
                    ops.insert(f.op.operator(), f.value.clone());
                }
                Err(_) => {
                    let mut ops = Document::new();
                    ops.insert(f.op.operator(), f.value.clone());
                    filter.insert(f.field.clone(), ops);
                }
            }
        }
        filter
    }

    pub fn sort_document(&self) -> Option<Document> {
        if self.sort.is_empty() {
            return None;
        }
        let mut sort = Document::new();
        for (field, order) in &self.sort {
            let dir = match order {
                SortOrder::Ascending => 1,
                SortOrder::Descending => -1,
            };
            sort.insert(field.clone(), dir);
        }
        Some(sort)
    }

    pub fn matches(&self, doc: &Document) -> bool {
        self.filters.iter().all(|f| {
            let actual = doc.get(&f.field).unwrap_or(&Bson::Null);
            let ord = compare_bson(actual, &f.value);
            let comparable = type_rank(actual) == type_rank(&f.value);
            match f.op {
                FilterOp::Eq => comparable && ord == Ordering::Equal,
                FilterOp::Ne => !(comparable && ord == Ordering::Equal),
                FilterOp::Gt => comparable && ord == Ordering::Greater,
                FilterOp::Gte => comparable && ord != Ordering::Less,
                FilterOp::Lt => comparable && ord == Ordering::Less,
                FilterOp::Lte => comparable && ord != Ordering::Greater,
            }
        })
    }

    pub fn compare(&self, a: &Document, b: &Document) -> Ordering {
        for (field, order) in &self.sort {
            let left = a.get(field).unwrap_or(&Bson::Null);
            let right = b.get(field).unwrap_or(&Bson::Null);
            let ord = match order {
                SortOrder::Ascending => compare_bson(left, right),
                SortOrder::Descending => compare_bson(right, left),
            };
            if ord != Ordering::Equal {
                return ord;
            }
        }
        Ordering::Equal
    }
}

/// Cross-type ordering follows MongoDB's BSON comparison order.
fn type_rank(value: &Bson) -> u8 {
    match value {
        Bson::Null | Bson::Undefined => 0,
        Bson::Int32(_) | Bson::Int64(_) | Bson::Double(_) | Bson::Decimal128(_) => 1,
        Bson::String(_) | Bson::Symbol(_) => 2,
        Bson::Document(_) => 3,
        Bson::Array(_) => 4,
        Bson::Binary(_) => 5,
        Bson::ObjectId(_) => 6,
        Bson::Boolean(_) => 7,
        Bson::DateTime(_) => 8,
        Bson::Timestamp(_) => 9,
        _ => 10,
    }
}

fn as_f64(value: &Bson) -> Option<f64> {
    match value {
        Bson::Int32(v) => Some(*v as f64),
        Bson::Int64(v) => Some(*v as f64),
        Bson::Double(v) => Some(*v),
        _ => None,
    }
}

pub fn compare_bson(a: &Bson, b: &Bson) -> Ordering {
    let (ra, rb) = (type_rank(a), type_rank(b));
    if ra != rb {
        return ra.cmp(&rb);
    }
    match (a, b) {
        (Bson::String(x), Bson::String(y)) => x.cmp(y),
        (Bson::ObjectId(x), Bson::ObjectId(y)) => x.bytes().cmp(&y.bytes()),
        (Bson::Boolean(x), Bson::Boolean(y)) => x.cmp(y),
        (Bson::DateTime(x), Bson::DateTime(y)) => x.timestamp_millis().cmp(&y.timestamp_millis()),
        (Bson::Timestamp(x), Bson::Timestamp(y)) => (x.time, x.increment).cmp(&(y.time, y.increment)),
        // Documents, arrays and binaries only ever compare equal or not
        _ => match (as_f64(a), as_f64(b)) {
            (Some(x), Some(y)) => x.partial_cmp(&y).unwrap_or(Ordering::Equal),
            _ => Ordering::Equal,
        },
    }
}
