mod common;

use anyhow::Result;
use serde_json::json;

use tcg_console::api::LoginRequest;
use tcg_console::http::Params;
use tcg_console::Console;

use common::{MockBackend, PASSWORD};

async fn signed_in(backend: &MockBackend) -> Result<Console> {
    let (mut console, _) = backend.console();
    console
        .login(&LoginRequest {
            account: "alice".to_string(),
            password: PASSWORD.to_string(),
        })
        .await?;
    Ok(console)
}

#[tokio::test]
async fn list_replaces_items_and_total() -> Result<()> {
    let backend = MockBackend::start().await?;
    let console = signed_in(&backend).await?;
    let mut requirements = console.requirements();

    let mut params = Params::new();
    params.insert("page".to_string(), "2".to_string());
    params.insert("keyword".to_string(), "login".to_string());

    let page = requirements.records.fetch_list(&params).await?;
    assert_eq!(page.items.len(), 2);
    assert_eq!(page.total, 12);
    assert_eq!(requirements.records.items().len(), 2);
    assert_eq!(requirements.records.total(), 12);
    assert!(!requirements.records.loading());

    let queries = backend.state.list_queries.lock().unwrap().clone();
    assert_eq!(queries, vec!["keyword=login&page=2".to_string()]);

    let modules = requirements.fetch_modules().await?;
    assert_eq!(modules, vec![json!("auth"), json!("billing")]);
    Ok(())
}

#[tokio::test]
async fn llm_configs_use_items_convention() -> Result<()> {
    let backend = MockBackend::start().await?;
    let console = signed_in(&backend).await?;
    let mut configs = console.llm_configs();

    let page = configs.records.fetch_list(&Params::new()).await?;
    assert_eq!(page.total, 2);
    assert_eq!(page.items[1]["name"], "qwen");
    Ok(())
}

#[tokio::test]
async fn llm_providers_degrade_to_empty() -> Result<()> {
    let backend = MockBackend::start().await?;
    let console = signed_in(&backend).await?;
    let mut configs = console.llm_configs();

    let providers = configs.fetch_providers().await;
    assert!(providers.is_empty());
    assert!(configs.providers().is_empty());
    Ok(())
}

#[tokio::test]
async fn set_default_reloads_both_lists() -> Result<()> {
    let backend = MockBackend::start().await?;
    let console = signed_in(&backend).await?;
    let mut configs = console.llm_configs();

    configs.fetch_all().await;
    assert_eq!(configs.default_config().map(|c| c["id"].clone()), Some(json!(1)));

    configs.set_default(2).await?;
    assert_eq!(configs.default_config().map(|c| c["id"].clone()), Some(json!(2)));
    assert_eq!(configs.records.total(), 2);
    assert_eq!(*backend.state.default_set.lock().unwrap(), vec![2]);
    Ok(())
}

#[tokio::test]
async fn failed_fetch_keeps_previous_items() -> Result<()> {
    let backend = MockBackend::start().await?;
    let console = signed_in(&backend).await?;
    let mut requirements = console.requirements();
    requirements.records.fetch_list(&Params::new()).await?;

    // a detail id the mock does not serve
    let err = requirements.records.fetch_one(99).await.unwrap_err();
    assert_eq!(err.error_code(), "HTTP_ERROR");
    assert_eq!(requirements.records.items().len(), 2);
    assert!(requirements.records.current().is_none());
    Ok(())
}

#[tokio::test]
async fn testcase_stats_and_export() -> Result<()> {
    let backend = MockBackend::start().await?;
    let console = signed_in(&backend).await?;
    let mut testcases = console.testcases();

    let stats = testcases.fetch_stats().await?;
    assert_eq!(stats.total, 10);
    assert_eq!(stats.blocked, 0);
    assert_eq!(testcases.stats().ai_generated, 4);

    let blob = testcases.export(&Params::new()).await?;
    assert_eq!(blob.filename.as_deref(), Some("testcases.xlsx"));
    Ok(())
}

#[tokio::test]
async fn reviews_list_and_per_testcase() -> Result<()> {
    let backend = MockBackend::start().await?;
    let console = signed_in(&backend).await?;
    let mut reviews = console.reviews();

    let page = reviews.records.fetch_list(&Params::new()).await?;
    assert_eq!(page.total, 1);

    let for_case = reviews.fetch_testcase_reviews(42).await?;
    assert_eq!(for_case, vec![json!({ "id": 7, "testcase_id": 42 })]);
    Ok(())
}
