//! Python bindings for `pint-highlight`.

use pint_highlight::{GrammarError, Options};
use pyo3::exceptions::PyValueError;
use pyo3::prelude::*;

fn to_py(err: GrammarError) -> PyErr {
    PyValueError::new_err(err.to_string())
}

/// A language registry preloaded with the Pint grammar.
#[pyclass(name = "Registry", module = "pint_highlight")]
struct PyRegistry {
    inner: pint_highlight::Registry,
}

#[pymethods]
impl PyRegistry {
    /// Creates a registry, optionally configured from an options JSON string.
    #[new]
    #[pyo3(signature = (options = None))]
    fn new(options: Option<&str>) -> PyResult<Self> {
        let mut inner = pint_highlight::Registry::with_builtin_languages().map_err(to_py)?;
        if let Some(json) = options {
            inner.configure(Options::from_json(json).map_err(to_py)?);
        }
        Ok(Self { inner })
    }

    /// Registers a grammar given as JSON.
    fn register(&mut self, grammar: &str) -> PyResult<()> {
        let grammar = pint_highlight::parse_grammar(grammar).map_err(to_py)?;
        self.inner.register(grammar).map_err(to_py)
    }

    /// Registered language names.
    fn languages(&self) -> Vec<String> {
        self.inner.languages().into_iter().map(str::to_string).collect()
    }

    /// Highlights `code` as `language` and returns HTML.
    fn highlight(&self, code: &str, language: &str) -> PyResult<String> {
        let result = self.inner.highlight(code, language).map_err(to_py)?;
        Ok(result.to_html(self.inner.options().class_prefix()))
    }

    /// Detects the language of `code`; returns `(language, relevance, html)`.
    fn highlight_auto(&self, code: &str) -> (String, u32, String) {
        let result = self.inner.highlight_auto(code);
        let html = result.to_html(self.inner.options().class_prefix());
        (result.language, result.relevance, html)
    }

    /// Highlights every `<pre><code>` block of an HTML document.
    fn render_code_blocks(&self, document: &str) -> String {
        pint_highlight::render_code_blocks(document, &self.inner)
    }
}

/// The `_pint_highlight` extension module.
#[pymodule]
fn _pint_highlight(m: &Bound<'_, PyModule>) -> PyResult<()> {
    m.add_class::<PyRegistry>()?;
    Ok(())
}
