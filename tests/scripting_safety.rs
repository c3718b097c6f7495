use bh1730_script::scripting::{RhaiEngine, ScriptEngine, ScriptError};
use rhai::Dynamic;

#[tokio::test]
async fn test_simple_script() {
    let mut engine = RhaiEngine::new();
    let result: Dynamic = engine.execute_script("5 + 5").await.unwrap().downcast().unwrap();
    assert_eq!(result.as_int().unwrap(), 10);
}

#[tokio::test]
async fn test_safety_limit() {
    let mut engine = RhaiEngine::new();
    let result = engine.execute_script("loop { }").await;

    match result {
        Err(ScriptError::Terminated { reason }) => {
            assert!(reason.contains("Safety limit exceeded"));
        }
        other => panic!("expected termination, got {:?}", other),
    }
}

#[tokio::test]
async fn test_script_validation() {
    let engine = RhaiEngine::new();

    assert!(engine.validate_script("let x = 10;").await.is_ok());
    assert!(engine.validate_script("let x = ;").await.is_err());
}
