//! Read/write timing model JSON files.
//!
//! The schema is defined by `domain::ModelFile`.

use std::fs::File;
use std::path::Path;

use crate::domain::ModelFile;
use crate::error::AppError;

/// Read a timing model JSON file.
pub fn read_model_json(path: &Path) -> Result<ModelFile, AppError> {
    let file = File::open(path)
        .map_err(|e| AppError::input(format!("Failed to open model JSON '{}': {e}", path.display())))?;
    serde_json::from_reader(file)
        .map_err(|e| AppError::input(format!("Invalid model JSON '{}': {e}", path.display())))
}

/// Write a timing model JSON file.
pub fn write_model_json(path: &Path, model: &ModelFile) -> Result<(), AppError> {
    let file = File::create(path)
        .map_err(|e| AppError::input(format!("Failed to create model JSON '{}': {e}", path.display())))?;
    serde_json::to_writer_pretty(file, model)
        .map_err(|e| AppError::input(format!("Failed to write model JSON: {e}")))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn minimal_model_gets_defaults() {
        let json = r#"{ "f0": 218.81, "pepoch_mjd": 55000.0, "dm": 15.99 }"#;
        let model: ModelFile = serde_json::from_str(json).unwrap();
        assert_eq!(model.psr, None);
        assert_eq!(model.spin_terms, 2);
        assert!(model.fit_offset);
        assert!(model.subtract_mean);
        assert!(model.dm_derivs.is_empty());
        assert_eq!(model.dmepoch_mjd, None);
    }

    #[test]
    fn model_file_survives_disk() {
        let model = ModelFile {
            psr: Some("J1713+0747".to_string()),
            f0: 218.811_843_796_082_5,
            pepoch_mjd: 55000.0,
            spin_terms: 2,
            fit_offset: true,
            dm: 15.99,
            dmepoch_mjd: Some(55100.0),
            dm_derivs: vec![1e-4],
            subtract_mean: false,
        };
        let tmp = tempfile::tempdir().expect("create temp dir");
        let path = tmp.path().join("model.json");
        write_model_json(&path, &model).unwrap();
        let back = read_model_json(&path).unwrap();
        assert_eq!(back, model);
    }

    #[test]
    fn missing_file_is_an_input_error() {
        let err = read_model_json(Path::new("/nonexistent/model.json")).unwrap_err();
        assert_eq!(err.kind(), crate::error::ErrorKind::Input);
    }
}
