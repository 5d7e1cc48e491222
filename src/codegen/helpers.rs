//! Template helper library
//!
//! Every helper is registered as a filter and as a function so templates can
//! write either `{{ name|capitalize }}` or `{{ capitalize(name) }}`. The
//! `add*` helpers change the renderer's inflection rules and render as `""`.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use minijinja::{Environment, Error, ErrorKind, Value};

use crate::inflect::Inflections;
use crate::naming::{capitalize, nounderscore, quote};

/// Inflection rules shared by the helpers of one renderer
#[derive(Debug, Clone)]
pub struct SharedInflections(Arc<Mutex<Inflections>>);

impl SharedInflections {
    pub fn new(rules: Inflections) -> Self {
        Self(Arc::new(Mutex::new(rules)))
    }

    fn lock(&self) -> MutexGuard<'_, Inflections> {
        self.0.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn reset(&self, rules: Inflections) {
        *self.lock() = rules;
    }

    pub fn snapshot(&self) -> Inflections {
        self.lock().clone()
    }

    fn with<R>(&self, f: impl FnOnce(&mut Inflections) -> R) -> R {
        f(&mut *self.lock())
    }
}

/// Install the helper library into `env`
pub fn register(env: &mut Environment<'static>, rules: &SharedInflections) {
    register_str(env, "tolower", |s| s.to_lowercase());
    register_str(env, "capitalize", capitalize);
    register_str(env, "nounderscore", nounderscore);
    register_str(env, "quote", quote);

    register_inflector(env, rules, "underscore", Inflections::underscore);
    register_inflector(env, rules, "camelize", Inflections::camelize);
    register_inflector(env, rules, "camelizedownfirst", Inflections::camelize_down_first);
    register_inflector(env, rules, "pluralize", Inflections::pluralize);
    register_inflector(env, rules, "singularize", Inflections::singularize);
    register_inflector(env, rules, "tableize", Inflections::tableize);
    register_inflector(env, rules, "typeify", Inflections::typeify);
    register_inflector(env, rules, "humanize", Inflections::humanize);

    register_field(env, "typenull", "type_null");
    register_field(env, "typepointer", "type_pointer");
    register_field(env, "typebare", "type");

    env.add_function("join", join);
    env.add_function("add", add);
    env.add_function("sub", sub);

    let r = rules.clone();
    env.add_function("addacronym", move |word: &str| {
        r.with(|rules| rules.add_acronym(word));
        String::new()
    });
    let r = rules.clone();
    env.add_function("adduncountable", move |word: &str| {
        r.with(|rules| rules.add_uncountable(word));
        String::new()
    });
    let r = rules.clone();
    env.add_function("addhuman", move |suffix: &str, replacement: &str| {
        r.with(|rules| rules.add_human(suffix, replacement));
        String::new()
    });
    let r = rules.clone();
    env.add_function("addirregular", move |singular: &str, plural: &str| {
        r.with(|rules| rules.add_irregular(singular, plural));
        String::new()
    });
    let r = rules.clone();
    env.add_function("addplural", move |suffix: &str, replacement: &str| {
        r.with(|rules| rules.add_plural(suffix, replacement));
        String::new()
    });
    let r = rules.clone();
    env.add_function("addsingular", move |suffix: &str, replacement: &str| {
        r.with(|rules| rules.add_singular(suffix, replacement));
        String::new()
    });
}

fn register_str(env: &mut Environment<'static>, name: &'static str, op: fn(&str) -> String) {
    env.add_filter(name, move |s: &str| op(s));
    env.add_function(name, move |s: &str| op(s));
}

fn register_inflector(
    env: &mut Environment<'static>,
    rules: &SharedInflections,
    name: &'static str,
    op: fn(&Inflections, &str) -> String,
) {
    let r = rules.clone();
    env.add_filter(name, move |s: &str| r.with(|rules| op(rules, s)));
    let r = rules.clone();
    env.add_function(name, move |s: &str| r.with(|rules| op(rules, s)));
}

/// Helpers reading a precomputed type expression off a field
fn register_field(env: &mut Environment<'static>, name: &'static str, attr: &'static str) {
    env.add_filter(name, move |field: Value| field_attr(&field, name, attr));
    env.add_function(name, move |field: Value| field_attr(&field, name, attr));
}

fn field_attr(field: &Value, helper: &str, attr: &str) -> Result<String, Error> {
    let value = field.get_attr(attr)?;
    if value.is_undefined() || value.is_none() {
        return Err(Error::new(
            ErrorKind::InvalidOperation,
            format!("{} expects a field, got {}", helper, field.kind()),
        ));
    }
    Ok(value.to_string())
}

fn join(items: Value, sep: &str) -> Result<String, Error> {
    let parts: Vec<String> = items.try_iter()?.map(|item| item.to_string()).collect();
    Ok(parts.join(sep))
}

fn add(x: i64, y: i64) -> Result<i64, Error> {
    x.checked_add(y)
        .ok_or_else(|| Error::new(ErrorKind::InvalidOperation, "add overflowed"))
}

fn sub(x: i64, y: i64) -> Result<i64, Error> {
    x.checked_sub(y)
        .ok_or_else(|| Error::new(ErrorKind::InvalidOperation, "sub overflowed"))
}
