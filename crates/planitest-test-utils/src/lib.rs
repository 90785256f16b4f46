//! Testing utilities for planitest
//!
//! Fake `om` runners, response builders, and a tracing initialiser.

#![allow(missing_docs)]

use parking_lot::Mutex;
use planitest::{CommandOutput, CommandRunner};
use serde_json::{json, Map, Value};
use std::collections::{HashMap, VecDeque};
use std::io;
use std::path::PathBuf;
use std::sync::Once;

/// Install a test subscriber honouring `RUST_LOG`; safe to call repeatedly
pub fn init_tracing() {
    static INIT: Once = Once::new();
    INIT.call_once(|| {
        let _ = tracing_subscriber::fmt()
            .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
            .with_test_writer()
            .try_init();
    });
}

/// Global arguments `OmTarget::new(url)` produces, followed by `rest`
pub fn om_args(url: &str, rest: &[&str]) -> Vec<String> {
    let mut args = vec![
        "--skip-ssl-validation".to_string(),
        "--target".to_string(),
        url.to_string(),
    ];
    args.extend(rest.iter().map(|s| (*s).to_string()));
    args
}

/// Body of `GET /api/v0/staged/products`
pub fn staged_products_body(products: &[(&str, &str, &str)]) -> String {
    let list: Vec<Value> = products
        .iter()
        .map(|(guid, product_type, version)| {
            json!({ "guid": guid, "type": product_type, "product_version": version })
        })
        .collect();
    Value::Array(list).to_string()
}

/// Body of a successful staged-manifest response
pub fn manifest_body(manifest: &Value) -> String {
    json!({ "Manifest": manifest, "errors": { "base": [] } }).to_string()
}

/// Body of a staged-manifest response carrying errors
pub fn render_errors_body(messages: &[&str]) -> String {
    json!({ "errors": { "base": messages } }).to_string()
}

/// Key a fake uses to pick a response: the subcommand, plus the API path
/// for `curl`
pub fn subcommand_key(args: &[String]) -> String {
    let mut rest = args.iter().map(String::as_str);
    let mut subcommand = Vec::new();
    while let Some(arg) = rest.next() {
        match arg {
            "--skip-ssl-validation" => {}
            "--target" => {
                rest.next();
            }
            other => {
                subcommand.push(other);
                subcommand.extend(rest.by_ref());
            }
        }
    }

    match subcommand.as_slice() {
        ["curl", flags @ ..] => {
            let path = flags
                .windows(2)
                .find(|pair| pair[0] == "--path")
                .map_or("", |pair| pair[1]);
            format!("curl {path}")
        }
        [first, ..] => (*first).to_string(),
        [] => String::new(),
    }
}

fn flag_value<'a>(args: &'a [String], flag: &str) -> Option<&'a str> {
    args.windows(2)
        .find(|pair| pair[0] == flag)
        .map(|pair| pair[1].as_str())
}

/// One invocation seen by a fake runner
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordedCall {
    pub program: String,
    pub args: Vec<String>,
    /// For `configure-product`: the `--config` path as passed
    pub config_path: Option<PathBuf>,
    /// For `configure-product`: the file contents at the time of the call
    pub config_contents: Option<String>,
}

impl RecordedCall {
    /// See [`subcommand_key`]
    pub fn key(&self) -> String {
        subcommand_key(&self.args)
    }
}

enum Scripted {
    Output(CommandOutput),
    Error(io::ErrorKind, String),
}

/// Scripted runner: responses queued per subcommand, every call recorded
///
/// Unscripted subcommands succeed with empty output. When a key has several
/// queued responses they are consumed in order; the last one repeats.
#[derive(Default)]
pub struct FakeCommandRunner {
    responses: Mutex<HashMap<String, VecDeque<Scripted>>>,
    calls: Mutex<Vec<RecordedCall>>,
}

impl FakeCommandRunner {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue an output for `key` (see [`subcommand_key`])
    pub fn on(self, key: &str, output: CommandOutput) -> Self {
        self.push(key, Scripted::Output(output));
        self
    }

    /// Queue a successful stdout for `key`
    pub fn on_success(self, key: &str, stdout: impl Into<String>) -> Self {
        self.on(key, CommandOutput::success(stdout))
    }

    /// Queue a non-zero exit for `key`
    pub fn on_failure(self, key: &str, code: i32, stderr: &str) -> Self {
        self.on(key, CommandOutput::failure(code, stderr))
    }

    /// Queue a failure to start the process for `key`
    pub fn on_spawn_error(self, key: &str, kind: io::ErrorKind, message: &str) -> Self {
        self.push(key, Scripted::Error(kind, message.to_string()));
        self
    }

    fn push(&self, key: &str, scripted: Scripted) {
        self.responses
            .lock()
            .entry(key.to_string())
            .or_default()
            .push_back(scripted);
    }

    /// Every call so far, in order
    pub fn calls(&self) -> Vec<RecordedCall> {
        self.calls.lock().clone()
    }

    /// Keys of every call so far, in order
    pub fn keys(&self) -> Vec<String> {
        self.calls.lock().iter().map(RecordedCall::key).collect()
    }

    /// The most recent `configure-product` call
    pub fn last_configure(&self) -> Option<RecordedCall> {
        self.calls
            .lock()
            .iter()
            .rev()
            .find(|call| call.key() == "configure-product")
            .cloned()
    }
}

impl CommandRunner for FakeCommandRunner {
    fn run(&self, program: &str, args: &[String]) -> io::Result<CommandOutput> {
        let call = record(program, args);
        let key = call.key();
        self.calls.lock().push(call);

        let mut responses = self.responses.lock();
        let Some(queue) = responses.get_mut(&key) else {
            return Ok(CommandOutput::success(""));
        };
        let scripted = if queue.len() > 1 {
            queue.pop_front()
        } else {
            queue.front().map(|s| match s {
                Scripted::Output(output) => Scripted::Output(output.clone()),
                Scripted::Error(kind, message) => Scripted::Error(*kind, message.clone()),
            })
        };

        match scripted {
            Some(Scripted::Output(output)) => Ok(output),
            Some(Scripted::Error(kind, message)) => Err(io::Error::new(kind, message)),
            None => Ok(CommandOutput::success("")),
        }
    }
}

fn record(program: &str, args: &[String]) -> RecordedCall {
    let config_path = if subcommand_key(args) == "configure-product" {
        flag_value(args, "--config").map(PathBuf::from)
    } else {
        None
    };
    let config_contents = config_path
        .as_ref()
        .and_then(|path| std::fs::read_to_string(path).ok());

    RecordedCall {
        program: program.to_string(),
        args: args.to_vec(),
        config_path,
        config_contents,
    }
}

/// Renders a manifest from the product properties last configured
pub type ManifestRenderer = dyn Fn(&Map<String, Value>) -> Value + Send + Sync;

/// Stateful stand-in for `om` talking to an Ops Manager
///
/// Tracks which products are staged and the last configuration applied, and
/// renders the manifest through a caller-supplied function of the
/// configured `product-properties` (flattened to `key: value`).
pub struct FakeOm {
    guid_prefix: String,
    renderer: Box<ManifestRenderer>,
    state: Mutex<FakeOmState>,
    calls: Mutex<Vec<RecordedCall>>,
}

#[derive(Default)]
struct FakeOmState {
    staged: Vec<(String, String)>,
    properties: Map<String, Value>,
}

impl FakeOm {
    pub fn new(renderer: impl Fn(&Map<String, Value>) -> Value + Send + Sync + 'static) -> Self {
        Self {
            guid_prefix: "guid".to_string(),
            renderer: Box::new(renderer),
            state: Mutex::new(FakeOmState::default()),
            calls: Mutex::new(Vec::new()),
        }
    }

    /// Pretend `product_type` is already staged at `version`
    pub fn with_staged(self, product_type: &str, version: &str) -> Self {
        self.state
            .lock()
            .staged
            .push((product_type.to_string(), version.to_string()));
        self
    }

    /// Every call so far, in order
    pub fn calls(&self) -> Vec<RecordedCall> {
        self.calls.lock().clone()
    }

    /// Product properties from the last configuration, flattened
    pub fn configured_properties(&self) -> Map<String, Value> {
        self.state.lock().properties.clone()
    }

    fn guid(&self, product_type: &str) -> String {
        format!("{product_type}-{}", self.guid_prefix)
    }

    fn handle(&self, call: &RecordedCall) -> CommandOutput {
        let args = &call.args;
        let mut state = self.state.lock();
        match call.key().as_str() {
            "revert-staged-changes" => {
                state.properties.clear();
                CommandOutput::success("")
            }
            "stage-product" => {
                let (Some(name), Some(version)) = (
                    flag_value(args, "--product-name"),
                    flag_value(args, "--product-version"),
                ) else {
                    return CommandOutput::failure(1, "stage-product requires name and version");
                };
                state.staged.retain(|(staged, _)| staged != name);
                state.staged.push((name.to_string(), version.to_string()));
                CommandOutput::success("")
            }
            "configure-product" => {
                let Some(contents) = call.config_contents.as_deref() else {
                    return CommandOutput::failure(1, "could not read config file");
                };
                match serde_json::from_str::<Value>(contents) {
                    Ok(config) => {
                        state.properties = flatten_product_properties(&config);
                        CommandOutput::success("")
                    }
                    Err(e) => CommandOutput::failure(1, &format!("invalid config: {e}")),
                }
            }
            "curl /api/v0/staged/products" => {
                let list: Vec<Value> = state
                    .staged
                    .iter()
                    .map(|(product_type, version)| {
                        json!({
                            "guid": self.guid(product_type),
                            "type": product_type,
                            "product_version": version,
                        })
                    })
                    .collect();
                CommandOutput::success(Value::Array(list).to_string())
            }
            key => {
                let staged_manifest = state.staged.iter().find(|(product_type, _)| {
                    key == format!("curl /api/v0/staged/products/{}/manifest", self.guid(product_type))
                });
                match staged_manifest {
                    Some(_) => CommandOutput::success(manifest_body(&(self.renderer)(&state.properties))),
                    None => CommandOutput::failure(1, &format!("unknown request: {key}")),
                }
            }
        }
    }
}

impl CommandRunner for FakeOm {
    fn run(&self, program: &str, args: &[String]) -> io::Result<CommandOutput> {
        let call = record(program, args);
        let output = self.handle(&call);
        self.calls.lock().push(call);
        Ok(output)
    }
}

/// `{"product-properties": {k: {"value": v}}}` → `{k: v}`
pub fn flatten_product_properties(config: &Value) -> Map<String, Value> {
    config
        .get("product-properties")
        .and_then(Value::as_object)
        .map(|properties| {
            properties
                .iter()
                .filter_map(|(key, setting)| {
                    setting.get("value").map(|value| (key.clone(), value.clone()))
                })
                .collect()
        })
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn subcommand_key_skips_global_flags() {
        let args = om_args("https://opsman", &["curl", "--path", "/api/v0/staged/products"]);
        assert_eq!(subcommand_key(&args), "curl /api/v0/staged/products");

        let args = om_args("https://opsman", &["stage-product", "--product-name", "cf"]);
        assert_eq!(subcommand_key(&args), "stage-product");
    }

    #[test]
    fn flatten_reads_values() {
        let config = json!({
            "product-properties": {
                ".properties.a": { "value": 1 },
                ".properties.b": { "selected_option": "x" }
            }
        });
        let flat = flatten_product_properties(&config);
        assert_eq!(flat.get(".properties.a"), Some(&json!(1)));
        assert!(!flat.contains_key(".properties.b"));
    }

    #[test]
    fn fake_runner_repeats_last_response() {
        let fake = FakeCommandRunner::new()
            .on_failure("revert-staged-changes", 1, "first")
            .on_success("revert-staged-changes", "second");
        let args = om_args("u", &["revert-staged-changes"]);

        assert_eq!(fake.run("om", &args).unwrap().stderr, "first");
        assert_eq!(fake.run("om", &args).unwrap().stdout, "second");
        assert_eq!(fake.run("om", &args).unwrap().stdout, "second");
        assert_eq!(fake.calls().len(), 3);
    }
}
