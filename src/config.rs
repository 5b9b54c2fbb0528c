//! The `config` command surface and the first-run initialization flow.
//!
//! Each subcommand is an independent transition: load the settings, apply
//! one change, persist. Business rules live here (an active provider must
//! be configured before `switch` selects it; an existing configuration is
//! only overwritten after confirmation), and this module is the only place
//! allowed to decide process exit codes. Lower components signal failure
//! with typed errors or boolean results.

use std::collections::BTreeMap;
use std::error::Error as StdError;

use console::style;
use thiserror::Error;

use crate::prompt::{Prompt, PromptError};
use crate::providers::{self, ProviderKind, UnknownProvider};
use crate::settings::Settings;
use crate::store::{SETTINGS_FILE_NAME, SettingsStore, StoreError};

/// Why a `switch` was refused. Either way the settings are not mutated.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum SwitchError {
    #[error(transparent)]
    Unknown(#[from] UnknownProvider),

    #[error("{0} is not configured. Run \"ai init\" or \"ai config add\" first.")]
    NotConfigured(ProviderKind),
}

/// Result of an `add` run that did not fail outright.
#[derive(Debug, PartialEq, Eq)]
pub enum AddOutcome {
    Saved { kind: ProviderKind, switched: bool },
    Declined,
}

/// Reassign the active provider after checking it against the full
/// registry and the stored credentials.
pub fn switch_provider(settings: &mut Settings, name: &str) -> Result<ProviderKind, SwitchError> {
    let kind: ProviderKind = name.parse()?;
    if !settings.providers.is_configured(kind) {
        return Err(SwitchError::NotConfigured(kind));
    }
    settings.provider = kind;
    Ok(kind)
}

/// Interactively configure one provider and persist the merged document.
///
/// When the chosen provider is already configured, the user must confirm
/// the overwrite; declining leaves the stored document untouched. After
/// saving, the user may switch the active provider to the new one in the
/// same run.
pub fn add_provider(
    store: &SettingsStore,
    settings: &mut Settings,
    prompt: &mut dyn Prompt,
) -> Result<AddOutcome, Box<dyn StdError>> {
    let names: Vec<&str> = ProviderKind::ALL.iter().map(ProviderKind::as_str).collect();
    let choice = prompt.select("Select a provider to configure:", &names)?;
    let kind: ProviderKind = choice.parse()?;

    if settings.providers.is_configured(kind) {
        let overwrite =
            prompt.confirm(&format!("{kind} is already configured. Overwrite it?"))?;
        if !overwrite {
            return Ok(AddOutcome::Declined);
        }
    }

    let provider_config = providers::configure(kind, prompt)?;
    settings.providers.insert(provider_config);
    store.save(settings, None)?;

    let mut switched = false;
    if settings.provider != kind {
        if prompt.confirm(&format!("Switch the active provider to {kind}?"))? {
            settings.provider = kind;
            store.save(settings, None)?;
            switched = true;
        }
    }

    Ok(AddOutcome::Saved { kind, switched })
}

/// First-run initialization: pick the storage directory (possibly enabling
/// iCloud sync), configure one provider, collect additional headers, and
/// persist the seeded document.
pub fn init(store: &SettingsStore, prompt: &mut dyn Prompt) -> Result<(), Box<dyn StdError>> {
    let dir = store.locator().resolve_initial_dir(prompt)?;

    let mut settings = Settings::default();
    let names: Vec<&str> = ProviderKind::ALL.iter().map(ProviderKind::as_str).collect();
    let choice = prompt.select("Select one model provider:", &names)?;
    let kind: ProviderKind = choice.parse()?;

    let provider_config = providers::configure(kind, prompt)?;
    settings.providers.insert(provider_config);
    settings.provider = kind;
    settings.payload = ask_string_map(prompt, "additional header")?;

    println!(
        "Saving settings at {}:\n{}",
        dir.join(SETTINGS_FILE_NAME).display(),
        serde_json::to_string_pretty(&settings)?
    );
    store.save(&settings, Some(&dir))?;
    Ok(())
}

/// Collect a free-form string map, one key/value pair per round, until the
/// user types `done`.
fn ask_string_map(
    prompt: &mut dyn Prompt,
    object_name: &str,
) -> Result<BTreeMap<String, String>, PromptError> {
    let mut map = BTreeMap::new();
    loop {
        let key = prompt.ask(&format!("Enter {object_name} key (or 'done' to finish):"))?;
        let key = key.trim();
        if key.eq_ignore_ascii_case("done") {
            break;
        }
        if key.is_empty() {
            continue;
        }
        let value = prompt.ask(&format!("Enter value for {object_name} '{key}':"))?;
        map.insert(key.to_string(), value);
    }
    Ok(map)
}

/// Print the active provider and each provider's configuration status,
/// with api keys masked.
pub fn show(settings: &Settings) {
    println!("Current configuration:");
    println!("Active provider: {}", settings.provider);
    println!("Configured providers:");
    for kind in ProviderKind::ALL {
        if settings.providers.is_configured(kind) {
            println!("  {} {kind} ({})", style("✅").green(), provider_detail(settings, kind));
        } else {
            println!("  {} {kind} (not configured)", style("❌").red());
        }
    }
}

fn provider_detail(settings: &Settings, kind: ProviderKind) -> String {
    match kind {
        ProviderKind::Kimi => match &settings.providers.kimi {
            Some(kimi) => format!("{}, key {}", kimi.endpoint, mask_key(&kimi.api_key)),
            None => String::new(),
        },
        ProviderKind::Gemini => match &settings.providers.gemini {
            Some(gemini) => match &gemini.endpoint {
                Some(endpoint) => format!("{}, key {}", endpoint, mask_key(&gemini.api_key)),
                None => format!("key {}", mask_key(&gemini.api_key)),
            },
            None => String::new(),
        },
    }
}

/// Mask a credential for display: the first four characters, then an
/// ellipsis. Short keys render as the ellipsis alone.
fn mask_key(key: &str) -> String {
    let prefix: String = key.chars().take(4).collect();
    if key.chars().count() <= 4 {
        "…".to_string()
    } else {
        format!("{prefix}…")
    }
}

fn show_sync_status(store: &SettingsStore) {
    let status = store.locator().status();
    let yes_no = |flag: bool| if flag { "yes" } else { "no" };
    println!("iCloud sync status:");
    println!("  Supported:      {}", yes_no(status.supported));
    println!("  Enabled:        {}", yes_no(status.enabled));
    println!("  Local settings: {}", if status.has_local { "present" } else { "absent" });
    println!("  Local path:     {}", status.local_path.display());
    println!("  iCloud path:    {}", status.cloud_path.display());
    println!("  Active path:    {}", status.active_path.display());
}

fn usage() {
    println!("Available commands:");
    println!("  ai config show                - Show current configuration");
    println!("  ai config add                 - Add or reconfigure a provider");
    println!("  ai config switch <provider>   - Switch active provider");
    println!("  ai config sync status         - Check iCloud sync status");
    println!("  ai config sync enable         - Enable iCloud sync (macOS only)");
    println!("  ai config sync disable        - Disable iCloud sync");
}

/// Dispatch one `config` invocation and translate outcomes into an exit
/// code. This is the only function in the crate that maps failures to
/// process termination.
pub fn run(action: &str, key: Option<&str>, store: &SettingsStore, prompt: &mut dyn Prompt) -> i32 {
    let mut settings = match store.load() {
        Ok(settings) => settings,
        Err(StoreError::Invalid(diagnostics)) => {
            for diagnostic in &diagnostics {
                eprintln!("{}", style(diagnostic).red());
            }
            eprintln!(
                "\nPlease check the parameters in {} to ensure they're correct. \
                 You can reset to default settings by running \"ai init\".",
                store.settings_path().display()
            );
            return 1;
        }
        Err(err) => {
            eprintln!("{}", style(err).red());
            return 1;
        }
    };

    match action {
        "show" => {
            show(&settings);
            0
        }
        "add" => match add_provider(store, &mut settings, prompt) {
            Ok(AddOutcome::Saved { kind, switched }) => {
                println!("{} Saved {kind} configuration.", style("✅").green());
                if switched {
                    println!("{} Switched to {kind}.", style("✅").green());
                }
                0
            }
            Ok(AddOutcome::Declined) => {
                println!("Keeping the existing configuration.");
                0
            }
            Err(err) => {
                eprintln!("{}", style(err).red());
                1
            }
        },
        "switch" => {
            let Some(name) = key else {
                eprintln!(
                    "{}",
                    style(format!(
                        "Please specify a valid provider: {}",
                        ProviderKind::registry_names()
                    ))
                    .red()
                );
                println!("Usage: ai config switch <provider>");
                return 1;
            };
            match switch_provider(&mut settings, name) {
                Ok(kind) => {
                    if store.save(&settings, None).is_err() {
                        return 1;
                    }
                    println!("{} Switched to {kind}.", style("✅").green());
                    0
                }
                Err(SwitchError::Unknown(err)) => {
                    eprintln!(
                        "{}",
                        style(format!(
                            "{err}. Valid providers: {}",
                            ProviderKind::registry_names()
                        ))
                        .red()
                    );
                    1
                }
                Err(err) => {
                    eprintln!("{}", style(err).red());
                    1
                }
            }
        }
        "sync" => match key {
            Some("status") => {
                show_sync_status(store);
                0
            }
            Some("enable") => match store.locator().enable_sync(prompt) {
                Ok(true) => 0,
                Ok(false) => 1,
                Err(err) => {
                    eprintln!("{}", style(format!("Failed to enable iCloud sync: {err}")).red());
                    1
                }
            },
            Some("disable") => match store.locator().disable_sync(prompt) {
                Ok(_) => 0,
                Err(err) => {
                    eprintln!("{}", style(format!("Failed to disable iCloud sync: {err}")).red());
                    1
                }
            },
            _ => {
                usage();
                0
            }
        },
        _ => {
            usage();
            0
        }
    }
}
