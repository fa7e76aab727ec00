use std::fs;
use std::path::Path;

use mcsqs_rs::assimilate::{
    AssimilateError, McsqsDrone, McsqsVersion, ObjectiveFunction, ScalingMatrix, BESTCORR_FILE,
    BESTSQS_FILE, CLUSTERS_FILE, VERSION_FILE,
};
use mcsqs_rs::prepare::{INPUT_ARGS_FILE, RNDSTR_FILE};
use tempfile::tempdir;

const RNDSTR: &str = "\
2.000000 0.000000 0.000000
0.000000 2.000000 0.000000
0.000000 0.000000 2.000000
1.000000 0.000000 0.000000
0.000000 1.000000 0.000000
0.000000 0.000000 1.000000
0.000000 0.000000 0.000000 Fe=0.5,Ni=0.5
";

// a 2x1x1 supercell of the input cell, as mcsqs writes it
const BESTSQS: &str = "\
2.000000 0.000000 0.000000
0.000000 2.000000 0.000000
0.000000 0.000000 2.000000
2 0 0
0 1 0
0 0 1
0.000000 0.000000 0.000000 Fe
1.000000 0.000000 0.000000 Ni
";

const BESTCORR: &str = "\
2	1.000000	-0.333333	0.000000
2	1.414214	0.333333	0.000000
Objective_function= -1.732051
";

fn write_mandatory(dir: &Path) {
    fs::write(dir.join(RNDSTR_FILE), RNDSTR).unwrap();
    fs::write(dir.join(BESTSQS_FILE), BESTSQS).unwrap();
    fs::write(dir.join(BESTCORR_FILE), BESTCORR).unwrap();
}

fn write_optional(dir: &Path) {
    fs::write(dir.join(VERSION_FILE), "mcsqs version 2.94\n").unwrap();
    // 2 header lines + 2 clusters of 7 lines each
    let mut clusters = String::from("header\nheader\n");
    for _ in 0..14 {
        clusters.push_str("x\n");
    }
    fs::write(dir.join(CLUSTERS_FILE), clusters).unwrap();
    fs::write(
        dir.join(INPUT_ARGS_FILE),
        r#"{"clusters": {"2": 3.0}, "user_input_settings": {"T": "1000"}, "walltime": 12.0}"#,
    )
    .unwrap();
}

#[test]
fn test_assimilates_a_complete_run_directory() {
    let dir = tempdir().unwrap();
    write_mandatory(dir.path());
    write_optional(dir.path());

    let record = McsqsDrone::new().assimilate(dir.path()).unwrap();

    assert_eq!(record.anonymous_formula, "AB");
    assert_eq!(record.disordered.num_sites(), 1);
    assert_eq!(record.bestsqs.num_sites(), 2);
    assert_eq!(record.size, 2.0);
    assert_eq!(
        record.objective_function,
        ObjectiveFunction::Measured(-1.732051)
    );
    assert_eq!(
        record.scaling_matrix,
        ScalingMatrix::Found([[2, 0, 0], [0, 1, 0], [0, 0, 1]])
    );
    // the doubled axis breaks cubic symmetry in the output cell
    assert_eq!(record.spacegroup, "tetragonal");
    assert_eq!(
        record.mcsqs_version,
        McsqsVersion::Known("mcsqs version 2.94".to_string())
    );
    assert_eq!(record.num_clusters, Some(2.0));
    assert_eq!(record.walltime, Some(12.0));
    assert_eq!(
        record.clusters.as_ref().unwrap().cutoffs().get(&2),
        Some(&3.0)
    );
    assert_eq!(
        record
            .user_input_settings
            .as_ref()
            .unwrap()
            .get("T")
            .map(String::as_str),
        Some("1000")
    );
    assert_eq!(record.mcsqs_rs_version, mcsqs_rs::VERSION);
    assert_eq!(record.task_id, None);
}

#[test]
fn test_missing_mandatory_file_aborts() {
    let dir = tempdir().unwrap();
    write_mandatory(dir.path());
    fs::remove_file(dir.path().join(BESTSQS_FILE)).unwrap();

    let err = McsqsDrone::new().assimilate(dir.path()).unwrap_err();
    match err {
        AssimilateError::MissingFile(path) => {
            assert!(path.ends_with(BESTSQS_FILE));
        }
        other => panic!("expected MissingFile, got {other:?}"),
    }
}

#[test]
fn test_missing_optional_files_degrade_to_sentinels() {
    let dir = tempdir().unwrap();
    write_mandatory(dir.path());

    let record = McsqsDrone::new().assimilate(dir.path()).unwrap();

    assert_eq!(record.mcsqs_version, McsqsVersion::Unknown);
    assert_eq!(record.num_clusters, None);
    assert_eq!(record.clusters, None);
    assert_eq!(record.user_input_settings, None);
    assert_eq!(record.walltime, None);
}

#[test]
fn test_malformed_args_file_degrades_like_a_missing_one() {
    let dir = tempdir().unwrap();
    write_mandatory(dir.path());
    fs::write(dir.path().join(INPUT_ARGS_FILE), "{not json").unwrap();

    let record = McsqsDrone::new().assimilate(dir.path()).unwrap();
    assert_eq!(record.clusters, None);
    assert_eq!(record.walltime, None);
}

#[test]
fn test_non_numeric_objective_is_kept_verbatim() {
    let dir = tempdir().unwrap();
    write_mandatory(dir.path());
    fs::write(
        dir.path().join(BESTCORR_FILE),
        "Objective_function= Perfect_match\n",
    )
    .unwrap();

    let record = McsqsDrone::new().assimilate(dir.path()).unwrap();
    assert_eq!(
        record.objective_function,
        ObjectiveFunction::Unparsed("Perfect_match".to_string())
    );
}

#[test]
fn test_record_serializes_to_legacy_document_shape() {
    let dir = tempdir().unwrap();
    write_mandatory(dir.path());
    write_optional(dir.path());

    let record = McsqsDrone::new().assimilate(dir.path()).unwrap();
    let doc = serde_json::to_value(&record).unwrap();

    // objective function and scaling matrix are stored as bare values
    assert_eq!(doc["objective_function"], serde_json::json!(-1.732051));
    assert!(doc["scaling_matrix"].is_array());
    assert_eq!(doc["mcsqs_version"], serde_json::json!("mcsqs version 2.94"));
    // unassigned task ids are omitted entirely
    assert!(doc.get("task_id").is_none());
}
