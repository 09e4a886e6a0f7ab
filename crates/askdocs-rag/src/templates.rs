//! Prompt templates with locale fallback
//!
//! Templates are keyed by `(locale, name)` and use `{{variable}}`
//! placeholders. Lookup walks an explicit ordered locale chain (requested
//! locale, then the configured default) rather than treating a missing
//! locale as an error. Substitution is strict: a placeholder with no
//! supplied value is a configuration error, never a silent blank.

use std::collections::HashMap;

use regex::Regex;

use askdocs_core::{Error, Result};

/// System instruction for the answer prompt.
pub const TEMPLATE_RAG_SYSTEM: &str = "rag_system";
/// One retrieved chunk, labeled with its 1-based retrieval rank.
pub const TEMPLATE_RAG_DOCUMENT: &str = "rag_document";
/// The user's question, closing the prompt.
pub const TEMPLATE_RAG_FOOTER: &str = "rag_footer";

const EN_RAG_SYSTEM: &str = "You are an assistant that answers the user's question using only the \
provided documents. Ignore the documents that are not related to the question. If the documents \
do not contain the answer, say that you could not find it. Answer in the same language as the \
question, and be precise and concise.";

const EN_RAG_DOCUMENT: &str = "## Document No: {{rank}}\n### Content: {{chunk_text}}";

const EN_RAG_FOOTER: &str = "Based only on the documents above, answer the question.\n\
## Question:\n{{question}}\n\n## Answer:";

const AR_RAG_SYSTEM: &str = "أنت مساعد يجيب عن سؤال المستخدم اعتمادًا على المستندات المقدمة فقط. \
تجاهل المستندات غير المتعلقة بالسؤال. إذا لم تحتوِ المستندات على الإجابة فاذكر أنك لم تجدها. \
أجب بلغة السؤال وكن دقيقًا وموجزًا.";

const AR_RAG_DOCUMENT: &str = "## مستند رقم: {{rank}}\n### المحتوى: {{chunk_text}}";

const AR_RAG_FOOTER: &str = "اعتمادًا على المستندات أعلاه فقط، أجب عن السؤال التالي.\n\
## السؤال:\n{{question}}\n\n## الإجابة:";

/// Registry of prompt templates across locales.
pub struct TemplateCatalog {
    templates: HashMap<(String, String), String>,
    default_locale: String,
    placeholder: Regex,
}

impl TemplateCatalog {
    /// Empty catalog with the given fallback locale.
    pub fn new(default_locale: impl Into<String>) -> Self {
        Self {
            templates: HashMap::new(),
            default_locale: default_locale.into(),
            placeholder: Regex::new(r"\{\{\s*([a-zA-Z_][a-zA-Z0-9_]*)\s*\}\}")
                .expect("placeholder pattern is valid"),
        }
    }

    /// Catalog pre-loaded with the built-in `en` and `ar` RAG templates.
    pub fn builtin(default_locale: impl Into<String>) -> Self {
        let mut catalog = Self::new(default_locale);
        catalog.register("en", TEMPLATE_RAG_SYSTEM, EN_RAG_SYSTEM);
        catalog.register("en", TEMPLATE_RAG_DOCUMENT, EN_RAG_DOCUMENT);
        catalog.register("en", TEMPLATE_RAG_FOOTER, EN_RAG_FOOTER);
        catalog.register("ar", TEMPLATE_RAG_SYSTEM, AR_RAG_SYSTEM);
        catalog.register("ar", TEMPLATE_RAG_DOCUMENT, AR_RAG_DOCUMENT);
        catalog.register("ar", TEMPLATE_RAG_FOOTER, AR_RAG_FOOTER);
        catalog
    }

    /// Add or replace a template.
    pub fn register(
        &mut self,
        locale: impl Into<String>,
        name: impl Into<String>,
        body: impl Into<String>,
    ) {
        self.templates
            .insert((locale.into(), name.into()), body.into());
    }

    /// Resolve and fill a template.
    pub fn render(
        &self,
        locale: &str,
        name: &str,
        vars: &HashMap<&str, String>,
    ) -> Result<String> {
        let template = self.lookup(locale, name)?;

        let mut out = String::with_capacity(template.len());
        let mut last = 0;
        for caps in self.placeholder.captures_iter(template) {
            let mat = caps.get(0).expect("capture 0 always present");
            let key = caps.get(1).expect("placeholder name group").as_str();
            let value = vars.get(key).ok_or_else(|| {
                Error::InvalidConfiguration(format!(
                    "template {name} references undeclared variable {key}"
                ))
            })?;
            out.push_str(&template[last..mat.start()]);
            out.push_str(value);
            last = mat.end();
        }
        out.push_str(&template[last..]);

        Ok(out)
    }

    fn lookup(&self, locale: &str, name: &str) -> Result<&str> {
        let mut tried = Vec::new();
        for candidate in self.locale_chain(locale) {
            if let Some(body) = self
                .templates
                .get(&(candidate.clone(), name.to_string()))
            {
                return Ok(body);
            }
            tried.push(candidate);
        }
        Err(Error::TemplateNotFound {
            name: name.to_string(),
            tried,
        })
    }

    /// Explicit ordered list of locales to try.
    fn locale_chain(&self, requested: &str) -> Vec<String> {
        let mut chain = vec![requested.to_string()];
        if requested != self.default_locale {
            chain.push(self.default_locale.clone());
        }
        chain
    }
}
