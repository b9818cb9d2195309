//! Pivot GVA observations into a category × year matrix, optionally indexed to 2010.

use std::collections::{BTreeSet, HashMap};
use std::sync::Arc;
use tracing::debug;

use crate::catalogue::{Grouping, ALL_SUB_SECTORS};
use crate::error::AggregateError;
use crate::matrix::{Matrix, MatrixRow};
use crate::table::GvaTable;

/// Indexed values are 100 in this year.
pub const BASE_YEAR: i32 = 2010;

/// Every cell is rounded to this many decimal places.
pub const ROUND_DECIMALS: i32 = 5;

/// Computes matrices from a shared, immutable table.
#[derive(Debug, Clone)]
pub struct Aggregator {
    table: Arc<GvaTable>,
}

impl Aggregator {
    pub fn new(table: Arc<GvaTable>) -> Self {
        Self { table }
    }

    pub fn table(&self) -> &GvaTable {
        &self.table
    }

    /// Like [`Aggregator::compute`], with the grouping given by its catalogue key.
    pub fn compute_named(&self, grouping: &str, indexed: bool) -> Result<Matrix, AggregateError> {
        let grouping: Grouping = grouping.parse()?;
        Ok(self.compute(grouping, indexed))
    }

    /// Build the matrix for `grouping`.
    ///
    /// Rows follow the catalogue order (absent categories become all-missing rows and
    /// uncatalogued ones are dropped). Columns are the years present after filtering.
    /// With `indexed`, the [`BASE_YEAR`] column becomes 100 and later years are
    /// rebased against it; earlier years keep their actual values.
    pub fn compute(&self, grouping: Grouping, indexed: bool) -> Matrix {
        let (years, sums) = self.sum_by_category(grouping);

        let rows = grouping
            .row_order()
            .iter()
            .map(|label| MatrixRow {
                label: label.to_string(),
                values: years
                    .iter()
                    .map(|year| sums.get(&(*label, *year)).copied())
                    .collect(),
            })
            .collect();

        let mut matrix = Matrix {
            grouping,
            indexed,
            years,
            rows,
        };
        if indexed {
            rebase(&mut matrix, BASE_YEAR);
        }
        round_cells(&mut matrix, ROUND_DECIMALS);

        debug!(
            grouping = grouping.label(),
            indexed,
            rows = matrix.rows.len(),
            years = matrix.years.len(),
            "computed matrix"
        );
        matrix
    }

    /// Filter rows for the grouping and sum gva per (category, year).
    /// Returns the distinct filtered years (ascending) and the sums.
    fn sum_by_category(&self, grouping: Grouping) -> (Vec<i32>, HashMap<(&str, i32), f64>) {
        let mut years = BTreeSet::new();
        let mut sums: HashMap<(&str, i32), f64> = HashMap::new();

        for obs in self.table.observations() {
            let category = match grouping {
                Grouping::All if obs.sub_sector == ALL_SUB_SECTORS => obs.sector.as_str(),
                Grouping::All => continue,
                g if obs.sector == g.label() => obs.sub_sector.as_str(),
                _ => continue,
            };
            years.insert(obs.year);
            if let Some(gva) = obs.gva {
                *sums.entry((category, obs.year)).or_insert(0.0) += gva;
            }
        }

        (years.into_iter().collect(), sums)
    }
}

/// Rebase every row on its `base_year` value.
fn rebase(matrix: &mut Matrix, base_year: i32) {
    let base_idx = matrix.year_index(base_year);
    let Matrix { years, rows, .. } = matrix;

    for row in rows.iter_mut() {
        let base = base_idx.and_then(|i| row.values[i]);
        for (value, year) in row.values.iter_mut().zip(years.iter()) {
            if *year > base_year {
                *value = match (*value, base) {
                    (Some(v), Some(b)) if b != 0.0 => Some(v / b * 100.0),
                    _ => None,
                };
            }
        }
        if let (Some(i), Some(_)) = (base_idx, base) {
            row.values[i] = Some(100.0);
        }
    }
}

fn round_cells(matrix: &mut Matrix, decimals: i32) {
    let factor = 10f64.powi(decimals);
    for value in matrix.rows.iter_mut().flat_map(|r| r.values.iter_mut()) {
        if let Some(v) = value {
            *v = (*v * factor).round_ties_even() / factor;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::table::Observation;

    fn aggregator(observations: Vec<Observation>) -> Aggregator {
        Aggregator::new(Arc::new(GvaTable::from_observations(observations)))
    }

    #[test]
    fn publishing_example_indexes_to_150() {
        let agg = aggregator(vec![
            Observation::new("Creative Industries", "Publishing", 2010, 100.0),
            Observation::new("Creative Industries", "Publishing", 2011, 150.0),
        ]);
        let actual = agg.compute(Grouping::CreativeIndustries, false);
        assert_eq!(actual.value("Publishing", 2010), Some(100.0));
        assert_eq!(actual.value("Publishing", 2011), Some(150.0));

        let indexed = agg.compute(Grouping::CreativeIndustries, true);
        assert_eq!(indexed.years, vec![2010, 2011]);
        assert_eq!(indexed.value("Publishing", 2010), Some(100.0));
        assert_eq!(indexed.value("Publishing", 2011), Some(150.0));
    }

    #[test]
    fn duplicates_are_summed() {
        let agg = aggregator(vec![
            Observation::new("Cultural Sector", "Arts", 2012, 1.25),
            Observation::new("Cultural Sector", "Arts", 2012, 2.5),
        ]);
        let m = agg.compute(Grouping::CulturalSector, false);
        assert_eq!(m.value("Arts", 2012), Some(3.75));
    }

    #[test]
    fn all_grouping_uses_sector_level_rows() {
        let agg = aggregator(vec![
            Observation::new("Tourism", "All", 2010, 50.0),
            Observation::new("Tourism", "Hotels", 2010, 30.0),
            Observation::new("UK", "All", 2011, 1000.0),
        ]);
        let m = agg.compute(Grouping::All, false);
        assert_eq!(m.years, vec![2010, 2011]);
        assert_eq!(m.value("Tourism", 2010), Some(50.0));
        assert_eq!(m.value("UK", 2011), Some(1000.0));
        assert_eq!(m.value("UK", 2010), None);
    }

    #[test]
    fn uncatalogued_categories_are_dropped_but_keep_their_years() {
        let agg = aggregator(vec![
            Observation::new("Cultural Sector", "Arts", 2010, 5.0),
            Observation::new("Cultural Sector", "Opera", 2015, 9.0),
        ]);
        let m = agg.compute(Grouping::CulturalSector, false);
        assert!(m.row("Opera").is_none());
        assert_eq!(m.years, vec![2010, 2015]);
        assert_eq!(m.value("Arts", 2015), None);
    }

    #[test]
    fn base_year_zero_or_missing_makes_later_years_missing() {
        let agg = aggregator(vec![
            Observation::new("Cultural Sector", "Arts", 2010, 0.0),
            Observation::new("Cultural Sector", "Arts", 2011, 4.0),
            Observation::new("Cultural Sector", "Radio", 2009, 7.0),
            Observation::new("Cultural Sector", "Radio", 2011, 8.0),
        ]);
        let m = agg.compute(Grouping::CulturalSector, true);
        assert_eq!(m.value("Arts", 2010), Some(100.0));
        assert_eq!(m.value("Arts", 2011), None);
        // Radio has no 2010 value: base stays missing, earlier year untouched
        assert_eq!(m.value("Radio", 2009), Some(7.0));
        assert_eq!(m.value("Radio", 2010), None);
        assert_eq!(m.value("Radio", 2011), None);
    }

    #[test]
    fn no_base_year_column_leaves_no_index() {
        let agg = aggregator(vec![
            Observation::new("Cultural Sector", "Arts", 2008, 3.0),
            Observation::new("Cultural Sector", "Arts", 2012, 6.0),
        ]);
        let m = agg.compute(Grouping::CulturalSector, true);
        assert_eq!(m.years, vec![2008, 2012]);
        assert_eq!(m.value("Arts", 2008), Some(3.0));
        assert_eq!(m.value("Arts", 2012), None);
    }

    #[test]
    fn null_gva_keeps_year_but_not_value() {
        let agg = aggregator(vec![Observation {
            sector: "Cultural Sector".to_string(),
            sub_sector: "Arts".to_string(),
            year: 2013,
            gva: None,
        }]);
        let m = agg.compute(Grouping::CulturalSector, false);
        assert_eq!(m.years, vec![2013]);
        assert!(m.is_all_missing());
    }

    #[test]
    fn rounds_to_five_decimals() {
        let agg = aggregator(vec![
            Observation::new("Cultural Sector", "Arts", 2010, 3.0),
            Observation::new("Cultural Sector", "Arts", 2011, 1.0),
            Observation::new("Cultural Sector", "Heritage", 2010, 1.123456789),
        ]);
        let m = agg.compute(Grouping::CulturalSector, true);
        assert_eq!(m.value("Arts", 2011), Some(33.33333));
        let raw = agg.compute(Grouping::CulturalSector, false);
        assert_eq!(raw.value("Heritage", 2010), Some(1.12346));
    }

    #[test]
    fn compute_named_rejects_unknown_grouping() {
        let agg = aggregator(vec![]);
        assert_eq!(
            agg.compute_named("Foo", false),
            Err(AggregateError::UnknownGrouping("Foo".to_string()))
        );
        let m = agg.compute_named("Digital Sector", false).unwrap();
        assert_eq!(m.grouping, Grouping::DigitalSector);
    }
}
