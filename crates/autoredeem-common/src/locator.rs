use serde::{Deserialize, Serialize};
use std::fmt;

/// How to find candidate elements on the page.
///
/// Text and name matching is case-insensitive. `name` and `pattern` are
/// regular expressions; `text` and `has_text` are plain substrings.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Query {
    /// ARIA role (explicit or implicit), optionally filtered by accessible name.
    Role {
        role: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        name: Option<String>,
    },
    /// Innermost elements whose rendered text contains `text`.
    Text { text: String },
    /// CSS selector, optionally narrowed to elements containing `has_text`.
    Css {
        selector: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        has_text: Option<String>,
    },
    #[serde(rename = "xpath")]
    XPath { expression: String },
    /// Form controls whose placeholder matches `pattern`.
    Placeholder { pattern: String },
    /// Form controls whose associated `<label>` contains `text`.
    Label { text: String },
}

impl Query {
    pub fn role(role: impl Into<String>, name: impl Into<String>) -> Self {
        Self::Role {
            role: role.into(),
            name: Some(name.into()),
        }
    }

    pub fn text(text: impl Into<String>) -> Self {
        Self::Text { text: text.into() }
    }

    pub fn css(selector: impl Into<String>) -> Self {
        Self::Css {
            selector: selector.into(),
            has_text: None,
        }
    }

    pub fn css_with_text(selector: impl Into<String>, text: impl Into<String>) -> Self {
        Self::Css {
            selector: selector.into(),
            has_text: Some(text.into()),
        }
    }

    pub fn xpath(expression: impl Into<String>) -> Self {
        Self::XPath {
            expression: expression.into(),
        }
    }

    pub fn placeholder(pattern: impl Into<String>) -> Self {
        Self::Placeholder {
            pattern: pattern.into(),
        }
    }

    pub fn label(text: impl Into<String>) -> Self {
        Self::Label { text: text.into() }
    }
}

impl fmt::Display for Query {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Query::Role { role, name: None } => write!(f, "role={}", role),
            Query::Role {
                role,
                name: Some(name),
            } => write!(f, "role={}[name=/{}/i]", role, name),
            Query::Text { text } => write!(f, "text=\"{}\"", text),
            Query::Css {
                selector,
                has_text: None,
            } => write!(f, "css={}", selector),
            Query::Css {
                selector,
                has_text: Some(text),
            } => write!(f, "css={} >> has-text=\"{}\"", selector, text),
            Query::XPath { expression } => write!(f, "xpath={}", expression),
            Query::Placeholder { pattern } => write!(f, "placeholder=/{}/i", pattern),
            Query::Label { text } => write!(f, "label=\"{}\"", text),
        }
    }
}

/// What the caller does with a resolved element.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StrategyAction {
    #[default]
    Click,
    Check,
    Fill,
}

/// One entry in an ordered fallback table.
///
/// A `force` strategy matches even when its element is not visible, which is
/// how styled-over radio inputs get selected.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LocatorStrategy {
    pub query: Query,
    #[serde(default)]
    pub action: StrategyAction,
    #[serde(default)]
    pub force: bool,
    /// Human-readable name for logs.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
}

impl LocatorStrategy {
    pub fn click(query: Query) -> Self {
        Self {
            query,
            action: StrategyAction::Click,
            force: false,
            label: None,
        }
    }

    pub fn check(query: Query) -> Self {
        Self {
            action: StrategyAction::Check,
            ..Self::click(query)
        }
    }

    pub fn fill(query: Query) -> Self {
        Self {
            action: StrategyAction::Fill,
            ..Self::click(query)
        }
    }

    pub fn forced(mut self) -> Self {
        self.force = true;
        self
    }

    pub fn labelled(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }
}

impl fmt::Display for LocatorStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.label {
            Some(label) => write!(f, "{} ({})", label, self.query)?,
            None => write!(f, "{}", self.query)?,
        }
        if self.force {
            write!(f, " [force]")?;
        }
        Ok(())
    }
}

/// Opaque id of an element located by a backend. Valid until the page navigates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ElementHandle(pub u32);

impl fmt::Display for ElementHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// A page condition to poll for.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum Predicate {
    SelectorAbsent(String),
    SelectorPresent(String),
    /// A JavaScript expression that must evaluate truthy.
    Script(String),
}

impl fmt::Display for Predicate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Predicate::SelectorAbsent(sel) => write!(f, "no element matching '{}'", sel),
            Predicate::SelectorPresent(sel) => write!(f, "an element matching '{}'", sel),
            Predicate::Script(expr) => write!(f, "script '{}'", expr),
        }
    }
}
