use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use directories::BaseDirs;
use serde::de::Deserializer;
use serde::Deserialize;
use tracing::warn;

use crate::table::LayoutDirection;

const CONFIG_FILE_NAME: &str = "config.toml";
const APP_NAME: &str = "coinbook";

#[derive(Debug, Clone)]
pub struct Config {
    pub config_path: PathBuf,
    pub db_path: PathBuf,
    pub wallets: Vec<WalletConfig>,
    pub table: TableConfig,
    pub keys: Keys,
    pub ui: UiConfig,
    pub commands: Commands,
}

impl Config {
    /// `(code, name)` pairs in the order they were configured.
    pub fn wallet_pairs(&self) -> Vec<(String, String)> {
        self.wallets
            .iter()
            .map(|w| (w.code.clone(), w.name.clone()))
            .collect()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct WalletConfig {
    pub code: String,
    pub name: String,
}

#[derive(Debug, Clone)]
pub struct TableConfig {
    pub rows_per_page: usize,
    pub page_size_options: Vec<usize>,
    pub striped_rows: bool,
    pub complete_icons: bool,
    pub direction: LayoutDirection,
}

#[derive(Debug, Clone)]
pub struct UiConfig {
    pub colors: UiColors,
}

#[derive(Debug, Clone)]
pub struct UiColors {
    pub border: RgbColor,
    pub selection_bg: RgbColor,
    pub selection_fg: RgbColor,
    pub header: RgbColor,
    pub stripe_bg: RgbColor,
    pub button: RgbColor,
    pub muted: RgbColor,
    pub error: RgbColor,
    pub status_fg: RgbColor,
    pub status_bg: RgbColor,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RgbColor {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

#[derive(Debug, Clone)]
pub struct Commands {
    pub copy: Option<CommandExec>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandExec {
    pub program: String,
    pub args: Vec<String>,
}

// =============================================================================
// Key Bindings - Context-aware with multiple bindings per action
// =============================================================================

/// All key bindings organized by context
#[derive(Debug, Clone)]
pub struct Keys {
    /// Active whenever no text field has focus
    pub global: GlobalKeys,
    /// Save-address form
    pub form: FormKeys,
    /// Contacts table
    pub table: TableKeys,
    /// Contacts search box
    pub search: InputKeys,
    /// Confirmation and share dialogs
    pub modal: InputKeys,
    /// Rename prompt
    pub prompt: InputKeys,
}

#[derive(Debug, Clone)]
pub struct GlobalKeys {
    pub quit: Vec<String>,
    pub focus_form: Vec<String>,
    pub focus_contacts: Vec<String>,
}

#[derive(Debug, Clone)]
pub struct FormKeys {
    pub next: Vec<String>,
    pub prev: Vec<String>,
    pub submit: Vec<String>,
    pub leave: Vec<String>,
    pub wallet_next: Vec<String>,
    pub wallet_prev: Vec<String>,
}

#[derive(Debug, Clone)]
pub struct TableKeys {
    pub next: Vec<String>,
    pub prev: Vec<String>,
    pub page_next: Vec<String>,
    pub page_prev: Vec<String>,
    pub page_first: Vec<String>,
    pub page_last: Vec<String>,
    pub column_next: Vec<String>,
    pub column_prev: Vec<String>,
    pub sort: Vec<String>,
    pub page_size: Vec<String>,
    pub search: Vec<String>,
    pub edit: Vec<String>,
    pub delete: Vec<String>,
    pub copy: Vec<String>,
    pub share: Vec<String>,
}

/// Confirm/cancel pair shared by the search box, dialogs and prompts.
#[derive(Debug, Clone)]
pub struct InputKeys {
    pub confirm: Vec<String>,
    pub cancel: Vec<String>,
}

// =============================================================================
// Default implementations
// =============================================================================

fn keys(list: &[&str]) -> Vec<String> {
    list.iter().map(|s| s.to_string()).collect()
}

impl Default for Keys {
    fn default() -> Self {
        Self {
            global: GlobalKeys::default(),
            form: FormKeys::default(),
            table: TableKeys::default(),
            search: InputKeys::default(),
            modal: InputKeys {
                confirm: keys(&["Enter", "y"]),
                cancel: keys(&["Escape", "n", "q"]),
            },
            prompt: InputKeys::default(),
        }
    }
}

impl Default for GlobalKeys {
    fn default() -> Self {
        Self {
            quit: keys(&["q"]),
            focus_form: keys(&["1"]),
            focus_contacts: keys(&["2"]),
        }
    }
}

impl Default for FormKeys {
    fn default() -> Self {
        Self {
            next: keys(&["Tab", "Down"]),
            prev: keys(&["Backtab", "Up"]),
            submit: keys(&["Enter"]),
            leave: keys(&["Escape"]),
            wallet_next: keys(&["Right"]),
            wallet_prev: keys(&["Left"]),
        }
    }
}

impl Default for TableKeys {
    fn default() -> Self {
        Self {
            next: keys(&["j", "Down"]),
            prev: keys(&["k", "Up"]),
            page_next: keys(&["l", "Right", "PageDown"]),
            page_prev: keys(&["h", "Left", "PageUp"]),
            page_first: keys(&["Home", "g"]),
            page_last: keys(&["End", "G"]),
            column_next: keys(&["]"]),
            column_prev: keys(&["["]),
            sort: keys(&["s"]),
            page_size: keys(&["p"]),
            search: keys(&["/"]),
            edit: keys(&["e"]),
            delete: keys(&["x", "Delete"]),
            copy: keys(&["y"]),
            share: keys(&["r"]),
        }
    }
}

impl Default for InputKeys {
    fn default() -> Self {
        Self {
            confirm: keys(&["Enter"]),
            cancel: keys(&["Escape"]),
        }
    }
}

impl Default for TableConfig {
    fn default() -> Self {
        Self {
            rows_per_page: 10,
            page_size_options: vec![10, 25, 50],
            striped_rows: true,
            complete_icons: true,
            direction: LayoutDirection::Ltr,
        }
    }
}

// =============================================================================
// Serde deserialization types (support both single string and array)
// =============================================================================

#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
enum KeyBinding {
    Single(String),
    Multiple(Vec<String>),
}

impl KeyBinding {
    fn into_vec(self) -> Vec<String> {
        match self {
            KeyBinding::Single(s) => vec![s],
            KeyBinding::Multiple(v) => v,
        }
    }
}

/// Overrides for one context; actions left out keep their defaults.
type ContextFile = HashMap<String, KeyBinding>;

#[derive(Debug, Deserialize, Default)]
#[serde(default)]
struct KeysFile {
    global: ContextFile,
    form: ContextFile,
    table: ContextFile,
    search: ContextFile,
    modal: ContextFile,
    prompt: ContextFile,
}

fn apply(overrides: &mut ContextFile, action: &str, target: &mut Vec<String>) {
    if let Some(binding) = overrides.remove(action) {
        *target = binding.into_vec();
    }
}

fn apply_input(mut file: ContextFile, keys: &mut InputKeys) {
    apply(&mut file, "confirm", &mut keys.confirm);
    apply(&mut file, "cancel", &mut keys.cancel);
}

impl From<KeysFile> for Keys {
    fn from(file: KeysFile) -> Self {
        let mut keys = Keys::default();

        let mut global = file.global;
        apply(&mut global, "quit", &mut keys.global.quit);
        apply(&mut global, "focus_form", &mut keys.global.focus_form);
        apply(&mut global, "focus_contacts", &mut keys.global.focus_contacts);

        let mut form = file.form;
        let f = &mut keys.form;
        apply(&mut form, "next", &mut f.next);
        apply(&mut form, "prev", &mut f.prev);
        apply(&mut form, "submit", &mut f.submit);
        apply(&mut form, "leave", &mut f.leave);
        apply(&mut form, "wallet_next", &mut f.wallet_next);
        apply(&mut form, "wallet_prev", &mut f.wallet_prev);

        let mut table = file.table;
        let t = &mut keys.table;
        apply(&mut table, "next", &mut t.next);
        apply(&mut table, "prev", &mut t.prev);
        apply(&mut table, "page_next", &mut t.page_next);
        apply(&mut table, "page_prev", &mut t.page_prev);
        apply(&mut table, "page_first", &mut t.page_first);
        apply(&mut table, "page_last", &mut t.page_last);
        apply(&mut table, "column_next", &mut t.column_next);
        apply(&mut table, "column_prev", &mut t.column_prev);
        apply(&mut table, "sort", &mut t.sort);
        apply(&mut table, "page_size", &mut t.page_size);
        apply(&mut table, "search", &mut t.search);
        apply(&mut table, "edit", &mut t.edit);
        apply(&mut table, "delete", &mut t.delete);
        apply(&mut table, "copy", &mut t.copy);
        apply(&mut table, "share", &mut t.share);

        apply_input(file.search, &mut keys.search);
        apply_input(file.modal, &mut keys.modal);
        apply_input(file.prompt, &mut keys.prompt);

        keys
    }
}

// =============================================================================
// Key binding validation
// =============================================================================

/// Single characters keep their case ('G' is Shift+g); key names do not.
fn normalize_binding(binding: &str) -> String {
    let trimmed = binding.trim();
    if trimmed.chars().count() == 1 {
        trimmed.to_string()
    } else {
        trimmed.to_ascii_lowercase()
    }
}

fn check_context_collisions(bindings: &[(&str, &[String])], context_name: &str) -> Result<()> {
    let mut seen: HashMap<String, &str> = HashMap::new();

    for (action_name, keys) in bindings {
        for key in *keys {
            let normalized = normalize_binding(key);
            if normalized.is_empty() {
                continue;
            }
            if let Some(existing_action) = seen.get(&normalized) {
                bail!(
                    "key binding collision in [keys.{}]: '{}' is bound to both '{}' and '{}'",
                    context_name,
                    key,
                    existing_action,
                    action_name
                );
            }
            seen.insert(normalized, action_name);
        }
    }

    Ok(())
}

fn validate_key_bindings(keys: &Keys) -> Result<()> {
    let g = &keys.global;
    let t = &keys.table;

    // Global keys stay live while the table has focus.
    check_context_collisions(
        &[
            ("quit", &g.quit),
            ("focus_form", &g.focus_form),
            ("focus_contacts", &g.focus_contacts),
            ("next", &t.next),
            ("prev", &t.prev),
            ("page_next", &t.page_next),
            ("page_prev", &t.page_prev),
            ("page_first", &t.page_first),
            ("page_last", &t.page_last),
            ("column_next", &t.column_next),
            ("column_prev", &t.column_prev),
            ("sort", &t.sort),
            ("page_size", &t.page_size),
            ("search", &t.search),
            ("edit", &t.edit),
            ("delete", &t.delete),
            ("copy", &t.copy),
            ("share", &t.share),
        ],
        "table",
    )?;

    let f = &keys.form;
    check_context_collisions(
        &[
            ("next", &f.next),
            ("prev", &f.prev),
            ("submit", &f.submit),
            ("leave", &f.leave),
            ("wallet_next", &f.wallet_next),
            ("wallet_prev", &f.wallet_prev),
        ],
        "form",
    )?;

    for (name, input) in [
        ("search", &keys.search),
        ("modal", &keys.modal),
        ("prompt", &keys.prompt),
    ] {
        check_context_collisions(
            &[("confirm", &input.confirm), ("cancel", &input.cancel)],
            name,
        )?;
    }

    Ok(())
}

// =============================================================================
// Config file structure
// =============================================================================

#[derive(Debug, Deserialize, Default)]
#[serde(default)]
struct ConfigFile {
    db_path: Option<PathBuf>,
    wallets: Vec<WalletConfig>,
    table: TableFile,
    keys: KeysFile,
    ui: UiFile,
    commands: CommandsFile,
}

#[derive(Debug, Deserialize)]
#[serde(default)]
struct TableFile {
    rows_per_page: usize,
    page_size_options: Vec<usize>,
    striped_rows: bool,
    complete_icons: bool,
    direction: LayoutDirection,
}

impl Default for TableFile {
    fn default() -> Self {
        let defaults = TableConfig::default();
        Self {
            rows_per_page: defaults.rows_per_page,
            page_size_options: defaults.page_size_options,
            striped_rows: defaults.striped_rows,
            complete_icons: defaults.complete_icons,
            direction: defaults.direction,
        }
    }
}

impl TableFile {
    fn into_config(self) -> Result<TableConfig> {
        if self.rows_per_page == 0 {
            bail!("table.rows_per_page must be greater than zero");
        }
        let mut options: Vec<usize> = self
            .page_size_options
            .into_iter()
            .filter(|&n| n > 0)
            .collect();
        if options.is_empty() {
            options.push(self.rows_per_page);
        }
        Ok(TableConfig {
            rows_per_page: self.rows_per_page,
            page_size_options: options,
            striped_rows: self.striped_rows,
            complete_icons: self.complete_icons,
            direction: self.direction,
        })
    }
}

/// Expand ~ to home directory in paths
fn expand_tilde(path: &Path) -> PathBuf {
    if let Ok(stripped) = path.strip_prefix("~") {
        if let Some(home) = home::home_dir() {
            return home.join(stripped);
        }
    }
    path.to_path_buf()
}

fn config_root() -> Result<PathBuf> {
    let base = BaseDirs::new().context("unable to determine base directories")?;
    Ok(base.config_dir().join(APP_NAME))
}

pub fn config_path() -> Result<PathBuf> {
    Ok(config_root()?.join(CONFIG_FILE_NAME))
}

fn resolve_path(path_override: Option<&Path>) -> Result<PathBuf> {
    match path_override {
        Some(path) => Ok(expand_tilde(path)),
        None => config_path(),
    }
}

pub fn load(path_override: Option<&Path>) -> Result<Config> {
    let path = resolve_path(path_override)?;
    if !path.exists() {
        bail!(
            "configuration file not found at {}. Run `coinbook init` to create it.",
            path.display()
        );
    }

    let raw = fs::read_to_string(&path)
        .with_context(|| format!("failed to read configuration file at {}", path.display()))?;
    parse(&raw, path)
}

pub(crate) fn parse(raw: &str, path: PathBuf) -> Result<Config> {
    let value: toml::Value = toml::from_str(raw)
        .with_context(|| format!("failed to parse {} as TOML", path.display()))?;

    warn_unknown_keys(&value);

    let cfg_file: ConfigFile = value
        .try_into()
        .with_context(|| format!("failed to deserialize config from {}", path.display()))?;

    let db_path = match cfg_file.db_path {
        Some(db_path) => {
            let expanded = expand_tilde(&db_path);
            match path.parent() {
                Some(parent) if expanded.is_relative() => parent.join(expanded),
                _ => expanded,
            }
        }
        None => crate::db::default_db_path()?,
    };

    let mut wallets: Vec<WalletConfig> = Vec::new();
    for wallet in cfg_file.wallets {
        let code = wallet.code.trim().to_ascii_uppercase();
        if code.is_empty() {
            bail!("wallets.code must not be empty");
        }
        if wallets.iter().any(|w| w.code == code) {
            bail!("wallet `{}` is configured twice", code);
        }
        wallets.push(WalletConfig {
            code,
            name: wallet.name,
        });
    }
    if wallets.is_empty() {
        warn!("no [[wallets]] configured; only wallets already in the store are available");
    }

    let keys: Keys = cfg_file.keys.into();
    validate_key_bindings(&keys)?;

    Ok(Config {
        config_path: path,
        db_path,
        wallets,
        table: cfg_file.table.into_config()?,
        keys,
        ui: cfg_file.ui.into(),
        commands: cfg_file.commands.into(),
    })
}

// =============================================================================
// Default config (coinbook init)
// =============================================================================

pub fn default_config_toml(db_path: Option<&Path>) -> String {
    let db_line = match db_path {
        Some(path) => format!(
            "db_path = {}\n",
            toml::Value::String(path.display().to_string())
        ),
        None => "# db_path = \"~/.local/share/coinbook/wallets.db\"\n".to_string(),
    };

    format!(
        r#"{db_line}
[[wallets]]
code = "BTC"
name = "Bitcoin"

[[wallets]]
code = "ETH"
name = "Ethereum"

[[wallets]]
code = "LTC"
name = "Litecoin"

[table]
rows_per_page = 10
page_size_options = [10, 25, 50]
striped_rows = true
complete_icons = true
direction = "ltr"

[commands]
# copy = ["wl-copy"]
"#
    )
}

/// Write the default config. Refuses to overwrite unless `force` is set.
pub fn write_default(path_override: Option<&Path>, db_path: Option<&Path>, force: bool) -> Result<PathBuf> {
    let path = resolve_path(path_override)?;
    if path.exists() && !force {
        bail!(
            "Configuration already exists at {} (use --force to overwrite)",
            path.display()
        );
    }
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)
                .with_context(|| format!("failed to create config dir: {}", parent.display()))?;
        }
    }
    fs::write(&path, default_config_toml(db_path))
        .with_context(|| format!("failed to write {}", path.display()))?;
    Ok(path)
}

// =============================================================================
// Unknown key warnings
// =============================================================================

const TOP_LEVEL_KEYS: &[&str] = &["db_path", "wallets", "table", "keys", "ui", "commands"];
const TABLE_KEYS: &[&str] = &[
    "rows_per_page",
    "page_size_options",
    "striped_rows",
    "complete_icons",
    "direction",
];
const KEY_CONTEXTS: &[(&str, &[&str])] = &[
    ("global", &["quit", "focus_form", "focus_contacts"]),
    (
        "form",
        &["next", "prev", "submit", "leave", "wallet_next", "wallet_prev"],
    ),
    (
        "table",
        &[
            "next",
            "prev",
            "page_next",
            "page_prev",
            "page_first",
            "page_last",
            "column_next",
            "column_prev",
            "sort",
            "page_size",
            "search",
            "edit",
            "delete",
            "copy",
            "share",
        ],
    ),
    ("search", &["confirm", "cancel"]),
    ("modal", &["confirm", "cancel"]),
    ("prompt", &["confirm", "cancel"]),
];
const UI_COLOR_KEYS: &[&str] = &[
    "border",
    "selection_bg",
    "selection_fg",
    "header",
    "stripe_bg",
    "button",
    "muted",
    "error",
    "status_fg",
    "status_bg",
];

fn warn_unknown_keys(value: &toml::Value) {
    let Some(table) = value.as_table() else {
        return;
    };

    warn_unknown_in(value, "", TOP_LEVEL_KEYS);

    if let Some(v) = table.get("table") {
        warn_unknown_in(v, "table.", TABLE_KEYS);
    }

    if let Some(keys_val) = table.get("keys") {
        let contexts: Vec<&str> = KEY_CONTEXTS.iter().map(|(name, _)| *name).collect();
        warn_unknown_in(keys_val, "keys.", &contexts);
        for (context, known) in KEY_CONTEXTS {
            if let Some(v) = keys_val.get(*context) {
                warn_unknown_in(v, &format!("keys.{}.", context), known);
            }
        }
    }

    if let Some(ui_val) = table.get("ui") {
        warn_unknown_in(ui_val, "ui.", &["colors"]);
        if let Some(colors) = ui_val.get("colors") {
            warn_unknown_in(colors, "ui.colors.", UI_COLOR_KEYS);
        }
    }

    if let Some(commands_val) = table.get("commands") {
        warn_unknown_in(commands_val, "commands.", &["copy"]);
    }
}

fn warn_unknown_in(value: &toml::Value, prefix: &str, known: &[&str]) {
    let Some(table) = value.as_table() else {
        return;
    };
    for key in table.keys() {
        if !known.contains(&key.as_str()) {
            warn!("unknown configuration key `{}{}`", prefix, key);
        }
    }
}

// =============================================================================
// UI config types
// =============================================================================

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
struct UiFile {
    colors: UiColorsFile,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
struct UiColorsFile {
    border: RgbColor,
    selection_bg: RgbColor,
    selection_fg: RgbColor,
    header: RgbColor,
    stripe_bg: RgbColor,
    button: RgbColor,
    muted: RgbColor,
    error: RgbColor,
    status_fg: RgbColor,
    status_bg: RgbColor,
}

impl Default for UiColorsFile {
    fn default() -> Self {
        Self {
            border: RgbColor::new(247, 147, 26),
            selection_bg: RgbColor::new(247, 147, 26),
            selection_fg: RgbColor::new(0, 0, 0),
            header: RgbColor::new(247, 147, 26),
            stripe_bg: RgbColor::new(28, 28, 28),
            button: RgbColor::new(120, 180, 255),
            muted: RgbColor::new(128, 128, 128),
            error: RgbColor::new(230, 80, 80),
            status_fg: RgbColor::new(247, 147, 26),
            status_bg: RgbColor::new(0, 0, 0),
        }
    }
}

impl From<UiFile> for UiConfig {
    fn from(file: UiFile) -> Self {
        let c = file.colors;
        Self {
            colors: UiColors {
                border: c.border,
                selection_bg: c.selection_bg,
                selection_fg: c.selection_fg,
                header: c.header,
                stripe_bg: c.stripe_bg,
                button: c.button,
                muted: c.muted,
                error: c.error,
                status_fg: c.status_fg,
                status_bg: c.status_bg,
            },
        }
    }
}

// =============================================================================
// Commands config
// =============================================================================

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
struct CommandsFile {
    copy: Option<CommandDef>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
enum CommandDef {
    Simple(String),
    List(Vec<String>),
}

impl From<CommandsFile> for Commands {
    fn from(file: CommandsFile) -> Self {
        Self {
            copy: file.copy.and_then(CommandExec::from_def),
        }
    }
}

impl CommandExec {
    fn from_def(def: CommandDef) -> Option<Self> {
        match def {
            CommandDef::Simple(cmd) => {
                let trimmed = cmd.trim();
                if trimmed.is_empty() {
                    None
                } else {
                    Some(Self {
                        program: trimmed.to_string(),
                        args: Vec::new(),
                    })
                }
            }
            CommandDef::List(mut parts) => {
                if parts.is_empty() {
                    return None;
                }
                let program = parts.remove(0);
                Some(Self {
                    program,
                    args: parts,
                })
            }
        }
    }
}

impl RgbColor {
    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }
}

impl<'de> serde::Deserialize<'de> for RgbColor {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Helper {
            Array([u8; 3]),
            Map { r: u8, g: u8, b: u8 },
        }

        let helper = Helper::deserialize(deserializer)?;
        let (r, g, b) = match helper {
            Helper::Array(values) => (values[0], values[1], values[2]),
            Helper::Map { r, g, b } => (r, g, b),
        };
        Ok(RgbColor { r, g, b })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse_str(raw: &str) -> Result<Config> {
        parse(raw, PathBuf::from("/tmp/coinbook/config.toml"))
    }

    #[test]
    fn test_default_config_parses() {
        let config = parse_str(&default_config_toml(Some(Path::new("/data/w.db")))).unwrap();
        assert_eq!(config.db_path, PathBuf::from("/data/w.db"));
        let codes: Vec<&str> = config.wallets.iter().map(|w| w.code.as_str()).collect();
        assert_eq!(codes, vec!["BTC", "ETH", "LTC"]);
        assert_eq!(config.table.rows_per_page, 10);
        assert_eq!(config.table.page_size_options, vec![10, 25, 50]);
        assert!(config.commands.copy.is_none());
    }

    #[test]
    fn test_relative_db_path_is_next_to_config() {
        let config = parse_str("db_path = \"wallets.db\"").unwrap();
        assert_eq!(config.db_path, PathBuf::from("/tmp/coinbook/wallets.db"));
    }

    #[test]
    fn test_wallet_codes_are_normalized_and_unique() {
        let config = parse_str(
            r#"
            [[wallets]]
            code = " btc "
            name = "Bitcoin"
            "#,
        )
        .unwrap();
        assert_eq!(config.wallet_pairs(), vec![("BTC".to_string(), "Bitcoin".to_string())]);

        let err = parse_str(
            r#"
            [[wallets]]
            code = "btc"
            name = "Bitcoin"
            [[wallets]]
            code = "BTC"
            name = "Again"
            "#,
        )
        .unwrap_err();
        assert!(err.to_string().contains("configured twice"));
    }

    #[test]
    fn test_key_overrides_accept_string_or_list() {
        let config = parse_str(
            r#"
            [keys.table]
            delete = "D"
            next = ["n", "Down"]
            "#,
        )
        .unwrap();
        assert_eq!(config.keys.table.delete, vec!["D"]);
        assert_eq!(config.keys.table.next, vec!["n", "Down"]);
        assert_eq!(config.keys.table.prev, vec!["k", "Up"]);
    }

    #[test]
    fn test_key_collision_is_rejected() {
        let err = parse_str(
            r#"
            [keys.table]
            sort = "e"
            "#,
        )
        .unwrap_err();
        assert!(err.to_string().contains("collision"));

        let err = parse_str(
            r#"
            [keys.global]
            quit = "s"
            "#,
        )
        .unwrap_err();
        assert!(err.to_string().contains("[keys.table]"));
    }

    #[test]
    fn test_case_matters_for_single_characters() {
        assert_ne!(normalize_binding("g"), normalize_binding("G"));
        assert_eq!(normalize_binding("ENTER"), normalize_binding("Enter"));
    }

    #[test]
    fn test_table_section() {
        let config = parse_str(
            r#"
            [table]
            rows_per_page = 25
            page_size_options = [0, 25]
            direction = "rtl"
            striped_rows = false
            "#,
        )
        .unwrap();
        assert_eq!(config.table.rows_per_page, 25);
        assert_eq!(config.table.page_size_options, vec![25]);
        assert_eq!(config.table.direction, LayoutDirection::Rtl);
        assert!(!config.table.striped_rows);
        assert!(config.table.complete_icons);

        assert!(parse_str("[table]\nrows_per_page = 0").is_err());
    }

    #[test]
    fn test_colors_and_copy_command() {
        let config = parse_str(
            r#"
            [ui.colors]
            border = [1, 2, 3]
            error = { r = 4, g = 5, b = 6 }

            [commands]
            copy = ["xclip", "-selection", "clipboard"]
            "#,
        )
        .unwrap();
        assert_eq!(config.ui.colors.border, RgbColor::new(1, 2, 3));
        assert_eq!(config.ui.colors.error, RgbColor::new(4, 5, 6));
        assert_eq!(
            config.commands.copy,
            Some(CommandExec {
                program: "xclip".into(),
                args: vec!["-selection".into(), "clipboard".into()],
            })
        );
    }

    #[test]
    fn test_write_default_refuses_overwrite() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("nested").join("config.toml");

        write_default(Some(&path), None, false).unwrap();
        let err = write_default(Some(&path), None, false).unwrap_err();
        assert!(err.to_string().contains("Configuration already exists"));
        write_default(Some(&path), Some(Path::new("/x.db")), true).unwrap();

        let config = load(Some(&path)).unwrap();
        assert_eq!(config.db_path, PathBuf::from("/x.db"));
    }
}
