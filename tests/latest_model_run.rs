// Mutates the process-wide run label, so it lives alone in this binary.

use astra_prognosis::commodity::{CHANA, SHRIMP, WHEAT};
use astra_prognosis::config::{
    ConfigError, DEFAULT_LATEST_MODEL_RUN, Settings, latest_model_run, set_latest_model_run,
};

#[test]
fn defaults_follow_the_latest_model_run() {
    assert_eq!(latest_model_run(), DEFAULT_LATEST_MODEL_RUN);
    assert!(WHEAT.export_defaults().models.contains(DEFAULT_LATEST_MODEL_RUN));

    set_latest_model_run("Predicted Mid August").unwrap();
    assert_eq!(latest_model_run(), "Predicted Mid August");
    for schema in [&WHEAT, &CHANA, &SHRIMP] {
        let models = schema.export_defaults().models;
        assert!(models.contains("Actual"));
        assert!(models.contains("Predicted Mid August"), "{}", schema.key);
    }
    // Wheat's interactive page keeps its fixed label.
    let interactive = WHEAT.interactive_defaults().models;
    assert!(interactive.contains("Predicted Mid July"));
    assert!(!interactive.contains("Predicted Mid August"));
    assert!(SHRIMP.interactive_defaults().models.contains("Predicted Mid August"));

    assert!(matches!(
        set_latest_model_run("   "),
        Err(ConfigError::EmptyModelRun)
    ));
    assert_eq!(latest_model_run(), "Predicted Mid August");

    let settings = Settings {
        latest_model_run: "Predicted Mid September".into(),
        ..Settings::default()
    };
    settings.apply().unwrap();
    assert_eq!(latest_model_run(), "Predicted Mid September");
}
