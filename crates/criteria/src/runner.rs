use crate::criteria::CompiledQuery;
use crate::entity::Entity;
use crate::error::CriteriaError;
use crate::query::{Query, QueryBuilder};
use crate::row::Row;

/// Executes rendered queries against a data store.
///
/// Implementors provide [`fetch`](Self::fetch); materialization into entities
/// and single-result checks are provided on top of it.
pub trait QueryRunner {
    /// Backend used to render statements for this runner.
    fn query_builder(&self) -> QueryBuilder {
        QueryBuilder::default()
    }

    /// Runs `query` and returns the raw rows.
    ///
    /// # Errors
    ///
    /// Returns an error if the store rejects the query or a value cannot be
    /// read back.
    fn fetch(&self, query: &Query) -> anyhow::Result<Vec<Row>>;

    /// Runs a compiled query, materializing every row.
    ///
    /// # Errors
    ///
    /// Returns rendering, store, and row conversion errors.
    fn get_result_list<S: Entity>(&self, query: &CompiledQuery<S>) -> anyhow::Result<Vec<S>> {
        let rows = self.fetch(&query.build_with(self.query_builder())?)?;
        let skip = usize::try_from(query.pending_offset())?;

        tracing::debug!(rows = rows.len(), skip, "fetched criteria rows");

        rows.iter().skip(skip).map(S::from_row).collect()
    }

    /// Runs a compiled query that must match exactly one row.
    ///
    /// # Errors
    ///
    /// Returns [`CriteriaError::NoResult`] or [`CriteriaError::NonUniqueResult`]
    /// alongside the errors of [`get_result_list`](Self::get_result_list).
    fn get_single_result<S: Entity>(&self, query: &CompiledQuery<S>) -> anyhow::Result<S> {
        let mut results = self.get_result_list(query)?;
        match results.len() {
            0 => Err(CriteriaError::NoResult.into()),
            1 => results.pop().ok_or_else(|| CriteriaError::NoResult.into()),
            n => Err(CriteriaError::NonUniqueResult(n).into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::EasyCriteriaQuery;
    use crate::row::{DataType, Field};

    #[derive(Debug)]
    struct Tag {
        label: String,
    }

    impl Entity for Tag {
        const TABLE: &'static str = "tags";

        fn projection() -> &'static [&'static str] {
            &["label"]
        }

        fn from_row(row: &Row) -> anyhow::Result<Self> {
            Ok(Self {
                label: crate::FetchValue::fetch(row, "label")?,
            })
        }
    }

    struct Canned(Vec<&'static str>);

    impl QueryRunner for Canned {
        fn fetch(&self, _query: &Query) -> anyhow::Result<Vec<Row>> {
            Ok(self
                .0
                .iter()
                .enumerate()
                .map(|(index, label)| Row {
                    index: index.to_string(),
                    fields: vec![Field {
                        name: "label".to_string(),
                        value: DataType::Str(Some((*label).to_string())),
                    }],
                })
                .collect())
        }
    }

    #[test]
    fn skips_pending_offset() {
        let runner = Canned(vec!["a", "b", "c"]);
        let tags = EasyCriteriaQuery::<Tag>::new().offset(2).get_result_list(&runner).unwrap();
        assert_eq!(tags.len(), 1);
        assert_eq!(tags[0].label, "c");
    }

    #[test]
    fn single_result_cardinality() {
        let err = EasyCriteriaQuery::<Tag>::new().get_single_result(&Canned(vec![])).unwrap_err();
        assert_eq!(err.downcast_ref::<CriteriaError>(), Some(&CriteriaError::NoResult));

        let err =
            EasyCriteriaQuery::<Tag>::new().get_single_result(&Canned(vec!["a", "b"])).unwrap_err();
        assert_eq!(err.downcast_ref::<CriteriaError>(), Some(&CriteriaError::NonUniqueResult(2)));

        let tag = EasyCriteriaQuery::<Tag>::new().get_single_result(&Canned(vec!["a"])).unwrap();
        assert_eq!(tag.label, "a");
    }
}
