#![allow(dead_code)]

use gvadash::{Aggregator, GvaTable, Observation};
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Small extract in the published layout: sector-level "All" rows plus
/// sub-sector rows for each breakdown, some labels with trailing spaces.
pub const SAMPLE_CSV: &str = "\
sector,sub-sector,year,gva
Creative Industries,All,2009,80000
Creative Industries,All,2010,90000
Creative Industries,All,2011,95000
Digital Sector,All,2010,110000
Digital Sector,All,2011,121000
UK,All,2010,1400000
UK,All,2011,1470000
Creative Industries,Publishing,2010,100
Creative Industries,Publishing,2011,150
Creative Industries,Advertising and marketing,2009,40
Creative Industries,Advertising and marketing,2010,50
Creative Industries,Advertising and marketing,2011,55
Creative Industries,Advertising and marketing,2011,5
Creative Industries,\"Architecture \",2010,20
Creative Industries,\"Architecture \",2011,0
Creative Industries,Ghost writing,2012,7
Digital Sector,\"Telecommunications        \",2010,30
Digital Sector,\"Telecommunications        \",2011,33
Digital Sector,\"Computer programming, consultancy and related activities        \",2011,12
Cultural Sector,Arts,2010,0
Cultural Sector,Arts,2011,10
Cultural Sector,Heritage,2011,4
";

/// Write SAMPLE_CSV into `dir` and return its path
pub fn write_sample_csv(dir: &Path) -> PathBuf {
    let path = dir.join("gva.csv");
    std::fs::write(&path, SAMPLE_CSV).unwrap();
    path
}

pub fn sample_aggregator(dir: &Path) -> Aggregator {
    let path = write_sample_csv(dir);
    let table = GvaTable::load(&path, &Default::default()).unwrap();
    Aggregator::new(Arc::new(table))
}

/// Aggregator over in-memory observations, no file involved
pub fn aggregator_from(observations: Vec<Observation>) -> Aggregator {
    Aggregator::new(Arc::new(GvaTable::from_observations(observations)))
}
