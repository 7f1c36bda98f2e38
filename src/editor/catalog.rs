//! Construct templates
//!
//! A [`ConstructDefinition`] describes something the user can insert: the
//! trigger strings that commit it while typing, an optional regex with a
//! capture (`for <name> in `), the autocomplete context it belongs to, and
//! the [`ConstructShape`] the engine instantiates.
//!
//! The built-in catalog covers the whole language surface. Extra templates
//! can be loaded from JSON; malformed entries are logged and skipped so a
//! single bad template never takes the catalog down with it.

use crate::editor::ast::{
    AugmentedOp, AutocompleteContext, BinaryOp, DataType, ImportRequirement, StatementKind,
    TypeSet, UnaryOp,
};
use crate::error::{EditorError, Result};
use regex::Regex;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

/// Statements built from a keyword alone
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum KeywordStatement {
    If,
    Elif,
    Else,
    While,
    Break,
    Continue,
}

impl KeywordStatement {
    pub fn statement_kind(self) -> StatementKind {
        match self {
            KeywordStatement::If => StatementKind::If,
            KeywordStatement::Elif => StatementKind::Elif,
            KeywordStatement::Else => StatementKind::Else,
            KeywordStatement::While => StatementKind::While,
            KeywordStatement::Break => StatementKind::Break,
            KeywordStatement::Continue => StatementKind::Continue,
        }
    }
}

/// What a template instantiates into
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ConstructShape {
    FunctionCall {
        name: String,
        #[serde(default)]
        args: Vec<TypeSet>,
        returns: DataType,
        /// Only allowed as a whole statement (`print`)
        #[serde(default)]
        statement_only: bool,
        #[serde(default)]
        import: Option<ImportRequirement>,
    },
    MethodCall {
        name: String,
        receiver: TypeSet,
        #[serde(default)]
        args: Vec<TypeSet>,
        returns: DataType,
    },
    ListAccess,
    Statement {
        statement: KeywordStatement,
    },
    ForLoop,
    Assignment,
    AugmentedAssignment {
        op: AugmentedOp,
    },
    Import {
        module: String,
        item: String,
    },
    BooleanLiteral {
        value: bool,
    },
    ListLiteral,
    UnaryOperator {
        op: UnaryOp,
    },
    BinaryOperator {
        op: BinaryOp,
    },
}

/// A template the engine can instantiate
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConstructDefinition {
    pub id: String,
    pub label: String,

    /// Literal strings that commit the construct while typing
    #[serde(default)]
    pub triggers: Vec<String>,

    /// Regex whose first capture group names something (`for i in `)
    #[serde(default)]
    pub pattern: Option<String>,

    /// Regex accepting text that may still grow into `pattern`
    #[serde(default)]
    pub partial: Option<String>,

    pub context: AutocompleteContext,
    pub shape: ConstructShape,

    #[serde(skip)]
    compiled: Option<Regex>,

    #[serde(skip)]
    compiled_partial: Option<Regex>,
}

/// Triggers ending in a word character wait for space, Enter or navigation
pub fn is_word_trigger(trigger: &str) -> bool {
    trigger
        .chars()
        .last()
        .map(|ch| ch.is_alphanumeric() || ch == '_')
        .unwrap_or(false)
}

impl ConstructDefinition {
    pub fn new(
        id: &str,
        label: &str,
        triggers: &[&str],
        context: AutocompleteContext,
        shape: ConstructShape,
    ) -> Self {
        Self {
            id: id.to_string(),
            label: label.to_string(),
            triggers: triggers.iter().map(|t| t.to_string()).collect(),
            pattern: None,
            partial: None,
            context,
            shape,
            compiled: None,
            compiled_partial: None,
        }
    }

    fn with_pattern(mut self, pattern: &str, partial: &str) -> Self {
        self.pattern = Some(pattern.to_string());
        self.partial = Some(partial.to_string());
        self
    }

    /// Check the definition and compile its patterns
    pub fn validate(mut self) -> Result<Self> {
        let malformed = |reason: &str| EditorError::MalformedTemplate {
            id: self.id.clone(),
            reason: reason.to_string(),
        };
        if self.id.trim().is_empty() {
            return Err(malformed("empty id"));
        }
        if self.triggers.iter().any(|t| t.is_empty()) {
            return Err(malformed("empty trigger"));
        }
        if self.triggers.is_empty() && self.pattern.is_none() {
            return Err(malformed("no trigger and no pattern"));
        }
        let needs_capture = matches!(
            self.shape,
            ConstructShape::ForLoop
                | ConstructShape::Assignment
                | ConstructShape::AugmentedAssignment { .. }
        );
        let compiled = match &self.pattern {
            Some(pattern) => {
                let regex = Regex::new(pattern).map_err(|e| malformed(&e.to_string()))?;
                if needs_capture && regex.captures_len() < 2 {
                    return Err(malformed("pattern needs a capture group"));
                }
                Some(regex)
            }
            None => None,
        };
        let compiled_partial = match &self.partial {
            Some(partial) => Some(Regex::new(partial).map_err(|e| malformed(&e.to_string()))?),
            None => None,
        };
        self.compiled = compiled;
        self.compiled_partial = compiled_partial;
        Ok(self)
    }

    /// First capture of the commit pattern, if it matches
    pub fn capture(&self, text: &str) -> Option<Option<String>> {
        let regex = self.compiled.as_ref()?;
        let captures = regex.captures(text)?;
        Some(captures.get(1).map(|m| m.as_str().to_string()))
    }

    pub fn has_pattern(&self) -> bool {
        self.compiled.is_some()
    }

    /// Whether `text` could still grow into this construct
    pub fn is_partial(&self, text: &str) -> bool {
        if self
            .triggers
            .iter()
            .any(|t| t.starts_with(text) && (t.len() > text.len() || is_word_trigger(t)))
        {
            return true;
        }
        self.compiled_partial
            .as_ref()
            .map(|regex| regex.is_match(text))
            .unwrap_or(false)
    }

    /// Non-word trigger typed exactly
    pub fn commits_immediately(&self, text: &str) -> bool {
        self.compiled.is_none()
            && self
                .triggers
                .iter()
                .any(|t| t == text && !is_word_trigger(t))
    }

    /// Word trigger typed exactly
    pub fn matches_word(&self, text: &str) -> bool {
        self.compiled.is_none() && self.triggers.iter().any(|t| t == text && is_word_trigger(t))
    }

    /// Whether instantiating needs a captured name
    pub fn needs_capture(&self) -> bool {
        self.has_pattern()
    }
}

/// The set of templates available to a session
#[derive(Debug, Clone, Default)]
pub struct Catalog {
    definitions: Vec<ConstructDefinition>,
}

fn any() -> TypeSet {
    TypeSet::any()
}

fn only(t: DataType) -> TypeSet {
    TypeSet::single(t)
}

fn call(name: &str, args: Vec<TypeSet>, returns: DataType) -> ConstructShape {
    ConstructShape::FunctionCall {
        name: name.to_string(),
        args,
        returns,
        statement_only: false,
        import: None,
    }
}

fn method(name: &str, receiver: TypeSet, args: Vec<TypeSet>, returns: DataType) -> ConstructShape {
    ConstructShape::MethodCall {
        name: name.to_string(),
        receiver,
        args,
        returns,
    }
}

fn random_call(name: &str, args: Vec<TypeSet>, returns: DataType) -> ConstructShape {
    ConstructShape::FunctionCall {
        name: name.to_string(),
        args,
        returns,
        statement_only: false,
        import: Some(ImportRequirement {
            module: "random".to_string(),
            item: name.to_string(),
        }),
    }
}

impl Catalog {
    pub fn empty() -> Self {
        Self::default()
    }

    /// Templates for the full built-in language surface
    pub fn builtin() -> Self {
        use AutocompleteContext::{Expression, RightOfExpression, StartOfLine};
        use DataType::*;

        let keyword = |statement| ConstructShape::Statement { statement };
        let augmented = |id: &str, symbol: &str, op| {
            let escaped = regex::escape(symbol);
            let first = regex::escape(&symbol[..1]);
            ConstructDefinition::new(
                id,
                &format!("name {} value", symbol),
                &[],
                StartOfLine,
                ConstructShape::AugmentedAssignment { op },
            )
            .with_pattern(
                &format!(r"^([A-Za-z_][A-Za-z0-9_]*) ?{}$", escaped),
                &format!(r"^[A-Za-z_][A-Za-z0-9_]* ?{}?$", first),
            )
        };

        let definitions = vec![
            // statements
            ConstructDefinition::new("if", "if", &["if "], StartOfLine, keyword(KeywordStatement::If)),
            ConstructDefinition::new("elif", "elif", &["elif "], StartOfLine, keyword(KeywordStatement::Elif)),
            ConstructDefinition::new("else", "else", &["else", "else:"], StartOfLine, keyword(KeywordStatement::Else)),
            ConstructDefinition::new("while", "while", &["while "], StartOfLine, keyword(KeywordStatement::While)),
            ConstructDefinition::new("break", "break", &["break"], StartOfLine, keyword(KeywordStatement::Break)),
            ConstructDefinition::new("continue", "continue", &["continue"], StartOfLine, keyword(KeywordStatement::Continue)),
            ConstructDefinition::new("for", "for loop", &["for "], StartOfLine, ConstructShape::ForLoop).with_pattern(
                r"^for ([A-Za-z_][A-Za-z0-9_]*) in $",
                r"^for ([A-Za-z_][A-Za-z0-9_]*( (in?)?)?)?$",
            ),
            ConstructDefinition::new("assign", "name = value", &[], StartOfLine, ConstructShape::Assignment)
                .with_pattern(r"^([A-Za-z_][A-Za-z0-9_]*) ?=$", r"^[A-Za-z_][A-Za-z0-9_]* ?$"),
            augmented("add_assign", "+=", AugmentedOp::Add),
            augmented("sub_assign", "-=", AugmentedOp::Sub),
            augmented("mul_assign", "*=", AugmentedOp::Mul),
            augmented("div_assign", "/=", AugmentedOp::Div),
            ConstructDefinition::new(
                "print",
                "print(...)",
                &["print("],
                StartOfLine,
                ConstructShape::FunctionCall {
                    name: "print".to_string(),
                    args: vec![any()],
                    returns: Void,
                    statement_only: true,
                    import: None,
                },
            ),
            ConstructDefinition::new(
                "import_randint",
                "from random import randint",
                &["from random import randint"],
                StartOfLine,
                ConstructShape::Import { module: "random".to_string(), item: "randint".to_string() },
            ),
            ConstructDefinition::new(
                "import_choice",
                "from random import choice",
                &["from random import choice"],
                StartOfLine,
                ConstructShape::Import { module: "random".to_string(), item: "choice".to_string() },
            ),
            // expressions
            ConstructDefinition::new("str", "str(...)", &["str("], Expression, call("str", vec![any()], String)),
            ConstructDefinition::new(
                "int",
                "int(...)",
                &["int("],
                Expression,
                call("int", vec![TypeSet::new([String, Number, Boolean])], Number),
            ),
            ConstructDefinition::new(
                "len",
                "len(...)",
                &["len("],
                Expression,
                call("len", vec![TypeSet::new([AnyList, String])], Number),
            ),
            ConstructDefinition::new("input", "input(...)", &["input("], Expression, call("input", vec![only(String)], String)),
            ConstructDefinition::new("range", "range(...)", &["range("], Expression, call("range", vec![only(Number)], Iterator)),
            ConstructDefinition::new("abs", "abs(...)", &["abs("], Expression, call("abs", vec![only(Number)], Number)),
            ConstructDefinition::new(
                "randint",
                "randint(...)",
                &["randint("],
                Expression,
                random_call("randint", vec![only(Number), only(Number)], Number),
            ),
            ConstructDefinition::new(
                "choice",
                "choice(...)",
                &["choice("],
                Expression,
                random_call("choice", vec![only(AnyList)], Any),
            ),
            ConstructDefinition::new("true", "True", &["True"], Expression, ConstructShape::BooleanLiteral { value: true }),
            ConstructDefinition::new("false", "False", &["False"], Expression, ConstructShape::BooleanLiteral { value: false }),
            ConstructDefinition::new("not", "not ...", &["not "], Expression, ConstructShape::UnaryOperator { op: UnaryOp::Not }),
            ConstructDefinition::new("list", "[...]", &["["], Expression, ConstructShape::ListLiteral),
            // modifiers and operators
            ConstructDefinition::new(
                "append",
                ".append(...)",
                &[".append("],
                RightOfExpression,
                method("append", only(AnyList), vec![any()], Void),
            ),
            ConstructDefinition::new("upper", ".upper()", &[".upper("], RightOfExpression, method("upper", only(String), vec![], String)),
            ConstructDefinition::new("lower", ".lower()", &[".lower("], RightOfExpression, method("lower", only(String), vec![], String)),
            ConstructDefinition::new(
                "split",
                ".split(...)",
                &[".split("],
                RightOfExpression,
                method("split", only(String), vec![only(String)], StringList),
            ),
            ConstructDefinition::new(
                "replace",
                ".replace(...)",
                &[".replace("],
                RightOfExpression,
                method("replace", only(String), vec![only(String), only(String)], String),
            ),
            ConstructDefinition::new(
                "find",
                ".find(...)",
                &[".find("],
                RightOfExpression,
                method("find", only(String), vec![only(String)], Number),
            ),
            ConstructDefinition::new(
                "count",
                ".count(...)",
                &[".count("],
                RightOfExpression,
                method("count", TypeSet::new([String, AnyList]), vec![any()], Number),
            ),
            ConstructDefinition::new("pop", ".pop()", &[".pop("], RightOfExpression, method("pop", only(AnyList), vec![], Any)),
            ConstructDefinition::new("index", "[index]", &["["], RightOfExpression, ConstructShape::ListAccess),
            ConstructDefinition::new("and", "and", &["and "], RightOfExpression, ConstructShape::BinaryOperator { op: BinaryOp::And }),
            ConstructDefinition::new("or", "or", &["or "], RightOfExpression, ConstructShape::BinaryOperator { op: BinaryOp::Or }),
        ];

        let mut catalog = Self::empty();
        for definition in definitions {
            catalog.register(definition);
        }
        catalog
    }

    /// Load templates from a JSON array, skipping entries that fail to parse
    pub fn from_json(json: &str) -> Result<Self> {
        let entries: Vec<serde_json::Value> = serde_json::from_str(json)?;
        let mut catalog = Self::empty();
        for (index, entry) in entries.into_iter().enumerate() {
            let parsed: ConstructDefinition = match serde_json::from_value(entry) {
                Ok(definition) => definition,
                Err(e) => {
                    warn!("Skipping construct template #{}: {}", index, e);
                    continue;
                }
            };
            catalog.register(parsed);
        }
        debug!("Loaded {} construct templates from JSON", catalog.len());
        Ok(catalog)
    }

    /// Validate and add a definition; replaces an existing one with the same id
    pub fn register(&mut self, definition: ConstructDefinition) -> bool {
        match definition.validate() {
            Ok(valid) => {
                self.definitions.retain(|d| d.id != valid.id);
                self.definitions.push(valid);
                true
            }
            Err(e) => {
                warn!("Rejected construct template: {}", e);
                false
            }
        }
    }

    /// Add every definition of `other`
    pub fn merge(&mut self, other: Catalog) {
        for definition in other.definitions {
            self.definitions.retain(|d| d.id != definition.id);
            self.definitions.push(definition);
        }
    }

    pub fn get(&self, id: &str) -> Option<&ConstructDefinition> {
        self.definitions.iter().find(|d| d.id == id)
    }

    pub fn require(&self, id: &str) -> Result<&ConstructDefinition> {
        self.get(id).ok_or_else(|| EditorError::UnknownTemplate(id.to_string()))
    }

    /// Function-call template by function name
    pub fn function(&self, name: &str) -> Option<&ConstructDefinition> {
        self.definitions.iter().find(|d| {
            matches!(&d.shape, ConstructShape::FunctionCall { name: n, .. } if n == name)
        })
    }

    pub fn in_context(
        &self,
        context: AutocompleteContext,
    ) -> impl Iterator<Item = &ConstructDefinition> {
        self.definitions.iter().filter(move |d| d.context == context)
    }

    pub fn definitions(&self) -> &[ConstructDefinition] {
        &self.definitions
    }

    pub fn len(&self) -> usize {
        self.definitions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.definitions.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builtin_catalog_registers_everything() {
        let catalog = Catalog::builtin();
        assert!(catalog.len() >= 38);
        assert!(catalog.get("print").is_some());
        assert!(catalog.function("randint").is_some());
        assert_eq!(catalog.in_context(AutocompleteContext::RightOfExpression).count(), 11);
    }

    #[test]
    fn test_for_pattern_captures_variable() {
        let catalog = Catalog::builtin();
        let for_loop = catalog.get("for").unwrap();
        assert_eq!(for_loop.capture("for item in "), Some(Some("item".to_string())));
        assert_eq!(for_loop.capture("for item"), None);
        assert!(for_loop.is_partial("for item i"));
        assert!(for_loop.is_partial("fo"));
        assert!(!for_loop.is_partial("for 1"));
    }

    #[test]
    fn test_trigger_kinds() {
        let catalog = Catalog::builtin();
        assert!(catalog.get("print").unwrap().commits_immediately("print("));
        assert!(!catalog.get("break").unwrap().commits_immediately("break"));
        assert!(catalog.get("break").unwrap().matches_word("break"));
        assert!(catalog.get("else").unwrap().commits_immediately("else:"));
    }

    #[test]
    fn test_from_json_skips_malformed_entries() {
        let json = r#"[
            {"id": "sum", "label": "sum(...)", "triggers": ["sum("], "context": "Expression",
             "shape": {"kind": "function_call", "name": "sum", "args": [["NumberList"]], "returns": "Number"}},
            {"id": "broken", "label": "broken", "context": "Expression"},
            {"id": "", "label": "no id", "triggers": ["x("], "context": "Expression",
             "shape": {"kind": "list_literal"}},
            {"id": "bad_regex", "label": "bad", "pattern": "(", "context": "StartOfLine",
             "shape": {"kind": "assignment"}}
        ]"#;
        let catalog = Catalog::from_json(json).unwrap();
        assert_eq!(catalog.len(), 1);
        let sum = catalog.get("sum").unwrap();
        assert_eq!(
            sum.shape,
            ConstructShape::FunctionCall {
                name: "sum".to_string(),
                args: vec![TypeSet::single(DataType::NumberList)],
                returns: DataType::Number,
                statement_only: false,
                import: None,
            }
        );
    }

    #[test]
    fn test_from_json_rejects_non_array() {
        assert!(Catalog::from_json("{\"id\": 1}").is_err());
    }
}
