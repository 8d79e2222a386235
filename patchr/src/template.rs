//! Template evaluation
//!
//! Directive content is rendered with Handlebars against the data context.
//! Strict mode is on, so a reference to a field missing from the context is
//! an error, and escaping is off because the output is source code.
//!
//! Besides the Handlebars built-ins (`if`, `each`, `with`, `eq`, `len`, ...)
//! the engine registers a small string/list/math library and the two input
//! helpers backed by the [`InputResolver`]:
//!
//! - `{{input "name"}}` (alias `i`) asks for a free-text value
//! - `{{choose "name" "a" "b"}}` (alias `select`) asks for one of the options

use handlebars::{
    Context, Handlebars, Helper, HelperDef, RenderContext, RenderError, RenderErrorReason, Renderable, ScopedJson,
    StringOutput, Template,
};
use serde_json::Value;
use tracing::debug;

use crate::error::PatchError;
use crate::resolver::InputResolver;

/// Handlebars registry with patchr's helpers
pub struct TemplateEngine {
    hbs: Handlebars<'static>,
}

impl std::fmt::Debug for TemplateEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TemplateEngine").finish_non_exhaustive()
    }
}

impl TemplateEngine {
    pub fn new(resolver: InputResolver) -> Self {
        let mut hbs = Handlebars::new();
        hbs.set_strict_mode(true);
        hbs.register_escape_fn(handlebars::no_escape);
        helpers::register(&mut hbs);

        let input = InputHelper {
            resolver: resolver.clone(),
        };
        let choose = ChooseHelper { resolver };
        hbs.register_helper("input", Box::new(input.clone()));
        hbs.register_helper("i", Box::new(input));
        hbs.register_helper("choose", Box::new(choose.clone()));
        hbs.register_helper("select", Box::new(choose));

        Self { hbs }
    }

    /// Parse and render `text`; `line` is the source line reported on failure
    pub fn render(&self, text: &str, data: &Value, line: usize) -> Result<String, PatchError> {
        debug!(%line, len = text.len(), "TemplateEngine::render: called");
        let template = Template::compile(text).map_err(|e| PatchError::TemplateParse {
            line,
            source: Box::new(e),
        })?;

        self.render_compiled(&template, data)
            .map_err(|e| PatchError::TemplateRender {
                line,
                source: Box::new(e),
            })
    }

    fn render_compiled(&self, template: &Template, data: &Value) -> Result<String, RenderError> {
        let ctx = Context::wraps(data)?;
        let mut rc = RenderContext::new(None);
        let mut out = StringOutput::new();
        template.render(&self.hbs, &ctx, &mut rc, &mut out)?;
        Ok(out.into_string()?)
    }
}

fn param_str<'a>(h: &'a Helper<'_>, index: usize, helper: &'static str) -> Result<&'a str, RenderError> {
    let param = h
        .param(index)
        .ok_or(RenderErrorReason::ParamNotFoundForIndex(helper, index))?;
    param
        .value()
        .as_str()
        .ok_or_else(|| RenderErrorReason::InvalidParamType("string").into())
}

fn param_i64(h: &Helper<'_>, index: usize, helper: &'static str) -> Result<i64, RenderError> {
    let param = h
        .param(index)
        .ok_or(RenderErrorReason::ParamNotFoundForIndex(helper, index))?;
    param
        .value()
        .as_i64()
        .ok_or_else(|| RenderErrorReason::InvalidParamType("i64").into())
}

#[derive(Clone)]
struct InputHelper {
    resolver: InputResolver,
}

impl HelperDef for InputHelper {
    fn call_inner<'reg: 'rc, 'rc>(
        &self,
        h: &Helper<'rc>,
        _: &'reg Handlebars<'reg>,
        _: &'rc Context,
        _: &mut RenderContext<'reg, 'rc>,
    ) -> Result<ScopedJson<'rc>, RenderError> {
        let name = param_str(h, 0, "input")?;
        let value = self
            .resolver
            .resolve_input(name)
            .map_err(|e| RenderErrorReason::Other(e.to_string()))?;
        Ok(ScopedJson::Derived(Value::String(value)))
    }
}

#[derive(Clone)]
struct ChooseHelper {
    resolver: InputResolver,
}

impl HelperDef for ChooseHelper {
    fn call_inner<'reg: 'rc, 'rc>(
        &self,
        h: &Helper<'rc>,
        _: &'reg Handlebars<'reg>,
        _: &'rc Context,
        _: &mut RenderContext<'reg, 'rc>,
    ) -> Result<ScopedJson<'rc>, RenderError> {
        let name = param_str(h, 0, "choose")?;
        let options = (1..h.params().len())
            .map(|i| param_str(h, i, "choose").map(str::to_string))
            .collect::<Result<Vec<_>, _>>()?;
        let value = self
            .resolver
            .resolve_choice(name, &options)
            .map_err(|e| RenderErrorReason::Other(e.to_string()))?;
        Ok(ScopedJson::Derived(Value::String(value)))
    }
}

mod helpers {
    use handlebars::{
        Context, Handlebars, Helper, HelperDef, JsonTruthy, RenderContext, RenderError, RenderErrorReason, ScopedJson,
        handlebars_helper,
    };
    use heck::{ToKebabCase, ToLowerCamelCase, ToPascalCase, ToSnakeCase};
    use serde_json::Value as Json;

    use super::{param_i64, param_str};

    /// Upper bound on the output of `repeat`, in bytes
    const MAX_REPEAT_LEN: usize = 1 << 20;

    handlebars_helper!(upper: |s: str| s.to_uppercase());
    handlebars_helper!(lower: |s: str| s.to_lowercase());
    handlebars_helper!(trim: |s: str| s.trim().to_string());
    handlebars_helper!(title: |s: str| title_case(s));
    handlebars_helper!(trim_prefix: |s: str, p: str| s.strip_prefix(p).unwrap_or(s).to_string());
    handlebars_helper!(trim_suffix: |s: str, p: str| s.strip_suffix(p).unwrap_or(s).to_string());
    handlebars_helper!(has_prefix: |s: str, p: str| s.starts_with(p));
    handlebars_helper!(has_suffix: |s: str, p: str| s.ends_with(p));
    handlebars_helper!(contains: |s: str, needle: str| s.contains(needle));
    handlebars_helper!(replace: |s: str, from: str, to: str| s.replace(from, to));
    handlebars_helper!(quote: |s: str| format!("\"{}\"", s));
    handlebars_helper!(squote: |s: str| format!("'{}'", s));
    handlebars_helper!(snakecase: |s: str| s.to_snake_case());
    handlebars_helper!(kebabcase: |s: str| s.to_kebab_case());
    handlebars_helper!(camelcase: |s: str| s.to_lower_camel_case());
    handlebars_helper!(pascalcase: |s: str| s.to_pascal_case());
    handlebars_helper!(default_value: |value: Json, fallback: Json| {
        if value.is_truthy(false) { value.clone() } else { fallback.clone() }
    });
    handlebars_helper!(join: |list: array, sep: str| {
        list.iter().map(display).collect::<Vec<_>>().join(sep)
    });
    handlebars_helper!(split: |s: str, sep: str| {
        s.split(sep).map(|part| Json::String(part.to_string())).collect::<Vec<_>>()
    });

    /// Checked integer arithmetic; overflow is a render error
    #[derive(Clone, Copy)]
    struct Arithmetic {
        name: &'static str,
        op: fn(i64, i64) -> Option<i64>,
    }

    impl HelperDef for Arithmetic {
        fn call_inner<'reg: 'rc, 'rc>(
            &self,
            h: &Helper<'rc>,
            _: &'reg Handlebars<'reg>,
            _: &'rc Context,
            _: &mut RenderContext<'reg, 'rc>,
        ) -> Result<ScopedJson<'rc>, RenderError> {
            let a = param_i64(h, 0, self.name)?;
            let b = param_i64(h, 1, self.name)?;
            let value = (self.op)(a, b)
                .ok_or_else(|| RenderErrorReason::Other(format!("{}: integer overflow ({}, {})", self.name, a, b)))?;
            Ok(ScopedJson::Derived(Json::from(value)))
        }
    }

    struct Repeat;

    impl HelperDef for Repeat {
        fn call_inner<'reg: 'rc, 'rc>(
            &self,
            h: &Helper<'rc>,
            _: &'reg Handlebars<'reg>,
            _: &'rc Context,
            _: &mut RenderContext<'reg, 'rc>,
        ) -> Result<ScopedJson<'rc>, RenderError> {
            let s = param_str(h, 0, "repeat")?;
            let count = h
                .param(1)
                .ok_or(RenderErrorReason::ParamNotFoundForIndex("repeat", 1))?
                .value()
                .as_u64()
                .ok_or(RenderErrorReason::InvalidParamType("u64"))?;
            let n = usize::try_from(count)
                .ok()
                .filter(|n| s.len().checked_mul(*n).is_some_and(|len| len <= MAX_REPEAT_LEN))
                .ok_or_else(|| {
                    let msg = format!("repeat: result exceeds {} bytes ({} x {})", MAX_REPEAT_LEN, s.len(), count);
                    RenderErrorReason::Other(msg)
                })?;
            Ok(ScopedJson::Derived(Json::String(s.repeat(n))))
        }
    }

    fn display(value: &Json) -> String {
        match value {
            Json::String(s) => s.clone(),
            other => other.to_string(),
        }
    }

    fn title_case(s: &str) -> String {
        let mut out = String::with_capacity(s.len());
        let mut at_word_start = true;
        for c in s.chars() {
            if at_word_start && c.is_alphabetic() {
                out.extend(c.to_uppercase());
            } else {
                out.push(c);
            }
            at_word_start = c.is_whitespace();
        }
        out
    }

    pub(super) fn register(hbs: &mut Handlebars<'static>) {
        hbs.register_helper("upper", Box::new(upper));
        hbs.register_helper("lower", Box::new(lower));
        hbs.register_helper("trim", Box::new(trim));
        hbs.register_helper("title", Box::new(title));
        hbs.register_helper("trimPrefix", Box::new(trim_prefix));
        hbs.register_helper("trimSuffix", Box::new(trim_suffix));
        hbs.register_helper("hasPrefix", Box::new(has_prefix));
        hbs.register_helper("hasSuffix", Box::new(has_suffix));
        hbs.register_helper("contains", Box::new(contains));
        hbs.register_helper("replace", Box::new(replace));
        hbs.register_helper("repeat", Box::new(Repeat));
        hbs.register_helper("quote", Box::new(quote));
        hbs.register_helper("squote", Box::new(squote));
        hbs.register_helper("snakecase", Box::new(snakecase));
        hbs.register_helper("kebabcase", Box::new(kebabcase));
        hbs.register_helper("camelcase", Box::new(camelcase));
        hbs.register_helper("pascalcase", Box::new(pascalcase));
        hbs.register_helper("default", Box::new(default_value));
        hbs.register_helper("join", Box::new(join));
        hbs.register_helper("split", Box::new(split));
        for (name, op) in [
            ("add", i64::checked_add as fn(i64, i64) -> Option<i64>),
            ("sub", i64::checked_sub),
            ("mul", i64::checked_mul),
        ] {
            hbs.register_helper(name, Box::new(Arithmetic { name, op }));
        }
    }

}
