//! Shared fixtures for the integration tests
//!
//! `fixture_config` writes a small six-table study into a temporary
//! directory and returns a configuration pointing at it with remote
//! download disabled.

#![allow(dead_code)]

use std::fs;
use std::path::Path;

use biomarker_explorer::{DataSource, ExplorerConfig};
use tempfile::TempDir;

pub const BIOMARKERS: &str = "\
PATNO,TESTNAME,TESTVALUE,RUNDATE,COHORT,PROJECTID,CLINICAL_EVENT,UNITS
1001,NEFL,14.0,2020-01-15,PD,177,BL,pg/mL
1001,NEFL,16.0,2020-01-15,PD,177,BL,pg/mL
1001,GFAP,120.0,2020-01-15,PD,177,BL,pg/mL
1001,pTau,22.5,2020-01-15,PD,124,BL,pg/mL
1002,NEFL,11.0,2020-01-15,PD,177,BL,pg/mL
1002,GFAP,140.0,2020-01-15,PD,177,BL,pg/mL
1002,pTau,19.0,2020-01-15,PD,124,BL,pg/mL
1003,NEFL,8.0,2020-01-15,Control,177,BL,pg/mL
1003,GFAP,90.0,2020-01-15,Control,177,BL,pg/mL
1003,pTau,<LLOQ,2020-01-15,Control,124,BL,pg/mL
1004,NEFL,10.0,2020-02-20,Prodromal,177,BL,pg/mL
1004,GFAP,100.0,2020-02-20,Prodromal,177,BL,pg/mL
1005,NEFL,7.0,2020-02-20,Control,177,BL,pg/mL
1005,GFAP,95.0,2020-02-20,Control,177,BL,pg/mL
1006,NEFL,13.0,2020-03-01,PD,177,V04,pg/mL
1006,GFAP,130.0,2020-03-01,PD,177,V04,pg/mL
1007,NEFL,6.0,,Control,177,V04,pg/mL
1001,Hemoglobin,13.5,2020-01-15,PD,999,BL,g/dL
9999,NEFL,50.0,2020-01-15,PD,177,BL,pg/mL
";

pub const DEMOGRAPHICS: &str = "\
PATNO,SEX,BIRTHDT,HANDED,HISPLAT,RAWHITE,RABLACK,RAASIAN
1001,1,01/1950,1,2,1,0,0
1002,0,06/1955,1,2,1,0,0
1003,1,03/1960,2,2,0,1,0
1004,0,09/1965,1,2,1,0,0
1005,1,12/1970,1,1,1,0,0
1006,1,05/1952,1,2,1,0,0
1007,0,07/1948,1,2,0,0,1
1001,0,01/1999,1,2,1,0,0
";

pub const AGE_AT_VISIT: &str = "\
PATNO,EVENT_ID,AGE_AT_VISIT
1007,V04,71.2
";

pub const CLINICAL_DIAGNOSIS: &str = "\
PATNO,EVENT_ID,PRIMDIAG,NEWDIAG
1001,BL,01,0
1002,BL,01,0
";

pub const MOTOR_ASSESSMENT: &str = "\
PATNO,EVENT_ID,NP3TOT,NP3RIGN
1001,BL,20,1
1001,V04,30,2
1002,BL,12,0
1003,BL,2,0
1004,BL,5,1
1006,BL,25,2
";

pub const GENETIC: &str = "\
PATNO,APOE,PATHVAR_COUNT,LRRK2,GBA,SNCA
1001,E3/E4,1,G2019S,0,0
1002,E3/E3,0,0,0,0
1004,E3/E3,0,0,0,0
1005,E2/E3,0,0,0,0
1006,E3/E3,2,0,N370S,0
";

/// Patients present in the demographics table
pub const KNOWN_PATIENTS: [&str; 7] = ["1001", "1002", "1003", "1004", "1005", "1006", "1007"];

fn write(dir: &Path, name: &str, contents: &str) -> DataSource {
    let file = format!("{name}.csv");
    fs::write(dir.join(&file), contents).expect("fixture file written");
    DataSource::new(name, file, None)
}

/// Write the fixture tables and return their configuration
///
/// The `TempDir` must outlive every loader built from the configuration.
pub fn fixture_config() -> (TempDir, ExplorerConfig) {
    let dir = tempfile::tempdir().expect("temporary directory");
    let mut config = ExplorerConfig::with_base_path(dir.path());
    config.allow_remote = false;

    let root = dir.path();
    config.sources.biomarker = write(root, "biomarker", BIOMARKERS);
    config.sources.demographics = write(root, "demographics", DEMOGRAPHICS);
    config.sources.age_at_visit = write(root, "age_at_visit", AGE_AT_VISIT);
    config.sources.clinical_diagnosis = write(root, "clinical_diagnosis", CLINICAL_DIAGNOSIS);
    config.sources.motor_assessment = write(root, "motor_assessment", MOTOR_ASSESSMENT);
    config.sources.genetic = write(root, "genetic", GENETIC);

    (dir, config)
}
