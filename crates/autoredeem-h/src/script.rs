use autoredeem_engine::backend::BackendError;
use chromiumoxide::Page;
use serde::de::DeserializeOwned;
use std::time::Duration;

const LOCATE_JS: &str = include_str!("locate.js");

/// Default timeout for JavaScript evaluation (10 seconds).
/// A pending dialog blocks the JS thread, so evaluation must not wait forever.
const EVAL_TIMEOUT: Duration = Duration::from_secs(10);

/// Maximum retries for context errors during page navigation.
const MAX_CONTEXT_RETRIES: u32 = 10;

/// Delay between retries when context is not found (page navigating).
const CONTEXT_RETRY_DELAY: Duration = Duration::from_millis(100);

/// Check if an error indicates the page context is unavailable (e.g., during navigation).
fn is_context_error(err: &str) -> bool {
    err.contains("Cannot find context")
        || err.contains("Execution context was destroyed")
        || err.contains("-32000")
}

enum EvalError {
    Timeout,
    Context(String),
    Other(String),
}

async fn evaluate_with_timeout(
    page: &Page,
    expression: &str,
) -> Result<serde_json::Value, EvalError> {
    let eval_result = tokio::time::timeout(EVAL_TIMEOUT, page.evaluate(expression)).await;

    match eval_result {
        Err(_) => Err(EvalError::Timeout),
        Ok(Err(e)) => {
            let err_str = e.to_string();
            if is_context_error(&err_str) {
                Err(EvalError::Context(err_str))
            } else {
                Err(EvalError::Other(err_str))
            }
        }
        Ok(Ok(remote_object)) => Ok(remote_object
            .into_value::<serde_json::Value>()
            .unwrap_or(serde_json::Value::Null)),
    }
}

/// Evaluate `expression`, retrying while the page is between documents.
pub async fn evaluate(page: &Page, expression: &str) -> Result<serde_json::Value, BackendError> {
    let mut last_error = None;

    for attempt in 0..MAX_CONTEXT_RETRIES {
        match evaluate_with_timeout(page, expression).await {
            Ok(value) => return Ok(value),
            Err(EvalError::Timeout) => {
                return Err(BackendError::timeout(
                    "script evaluation (possibly blocked by a dialog)",
                    EVAL_TIMEOUT,
                ));
            }
            Err(EvalError::Context(err_str)) => {
                tracing::debug!(
                    "Context error during evaluation (attempt {}/{}), retrying...",
                    attempt + 1,
                    MAX_CONTEXT_RETRIES
                );
                last_error = Some(err_str);
                tokio::time::sleep(CONTEXT_RETRY_DELAY).await;
            }
            Err(EvalError::Other(err_str)) => return Err(BackendError::Script(err_str)),
        }
    }

    Err(BackendError::Script(last_error.unwrap_or_else(|| {
        "Evaluation failed after retries".to_string()
    })))
}

/// Make sure the locator helpers exist in the current document.
pub async fn ensure_injected(page: &Page) -> Result<(), BackendError> {
    let loaded = evaluate(page, "typeof window.__autoredeem !== 'undefined'").await?;
    if loaded.as_bool() != Some(true) {
        evaluate(page, LOCATE_JS).await?;
    }
    Ok(())
}

/// Call `window.__autoredeem.<function>(args...)` and decode the result.
///
/// Injection is repeated on every call since any navigation discards it.
pub async fn call<T: DeserializeOwned>(
    page: &Page,
    function: &str,
    args: &[serde_json::Value],
) -> Result<T, BackendError> {
    ensure_injected(page).await?;
    let args = args
        .iter()
        .map(serde_json::to_string)
        .collect::<Result<Vec<_>, _>>()?
        .join(", ");
    let expression = format!("window.__autoredeem.{}({})", function, args);
    tracing::trace!("Evaluating script: {}", expression);
    let value = evaluate(page, &expression).await?;
    Ok(serde_json::from_value(value)?)
}
