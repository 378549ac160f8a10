use fluent_bundle::concurrent::FluentBundle;
use fluent_bundle::{FluentArgs, FluentResource};
use std::collections::HashMap;
use std::sync::{Arc, OnceLock};
use unic_langid::LanguageIdentifier;
use anyhow::Result;
use tracing::warn;

/// Language used when the agent's Telegram language isn't supported
pub const DEFAULT_LANGUAGE: &str = "ka";

const RESOURCES: &[(&str, &str)] = &[
    ("ka", include_str!("../locales/ka/main.ftl")),
    ("en", include_str!("../locales/en/main.ftl")),
];

/// Localization manager for the HotelClaim bot
pub struct LocalizationManager {
    bundles: HashMap<String, Arc<FluentBundle<FluentResource>>>,
}

impl LocalizationManager {
    /// Create a new localization manager with every embedded language
    pub fn new() -> Result<Self> {
        let mut bundles = HashMap::new();

        for (language, source) in RESOURCES {
            let locale: LanguageIdentifier = language.parse()?;
            let bundle = Self::create_bundle(&locale, source);
            bundles.insert((*language).to_string(), Arc::new(bundle));
        }

        Ok(Self { bundles })
    }

    /// Create a fluent bundle for a specific locale
    fn create_bundle(locale: &LanguageIdentifier, source: &str) -> FluentBundle<FluentResource> {
        let mut bundle = FluentBundle::new_concurrent(vec![locale.clone()]);
        // No Unicode isolation marks around arguments; Telegram shows them as junk
        bundle.set_use_isolating(false);

        let resource = FluentResource::try_new(source.to_string()).unwrap_or_else(|(resource, errors)| {
            warn!(locale = %locale, errors = errors.len(), "Fluent resource parsed with errors");
            resource
        });
        if let Err(errors) = bundle.add_resource(resource) {
            warn!(locale = %locale, errors = errors.len(), "Fluent resource has conflicting messages");
        }

        bundle
    }

    /// Get a localized message in the given language, falling back to the default language
    pub fn get_message_in_language(
        &self,
        key: &str,
        language: &str,
        args: Option<&HashMap<&str, &str>>,
    ) -> String {
        let bundle = self
            .bundles
            .get(language)
            .filter(|b| b.has_message(key))
            .or_else(|| self.bundles.get(DEFAULT_LANGUAGE));

        let Some(bundle) = bundle else {
            return format!("Missing translation: {}", key);
        };

        let pattern = match bundle.get_message(key).and_then(|msg| msg.value()) {
            Some(pattern) => pattern,
            None => return format!("Missing translation: {}", key),
        };

        let fluent_args = args.map(|args| {
            let mut fluent_args = FluentArgs::new();
            for (k, v) in args {
                fluent_args.set(*k, *v);
            }
            fluent_args
        });

        let mut errors = vec![];
        bundle
            .format_pattern(pattern, fluent_args.as_ref(), &mut errors)
            .into_owned()
    }
}

/// Map a Telegram language code to a supported language
pub fn detect_language(language_code: Option<&str>) -> &'static str {
    match language_code.map(|code| code.to_lowercase()) {
        Some(code) if code == "en" || code.starts_with("en-") => "en",
        _ => DEFAULT_LANGUAGE,
    }
}

/// Global localization instance
static LOCALIZATION_MANAGER: OnceLock<LocalizationManager> = OnceLock::new();

/// Initialize the global localization manager
pub fn init_localization() -> Result<()> {
    if LOCALIZATION_MANAGER.get().is_none() {
        let manager = LocalizationManager::new()?;
        // Losing a race with another initializer is fine, both are identical
        let _ = LOCALIZATION_MANAGER.set(manager);
    }
    Ok(())
}

/// Get the global localization manager
fn get_localization_manager() -> Option<&'static LocalizationManager> {
    if LOCALIZATION_MANAGER.get().is_none() {
        if let Err(e) = init_localization() {
            warn!(error = %e, "Failed to initialize localization");
        }
    }
    LOCALIZATION_MANAGER.get()
}

/// Localized message for the agent's Telegram language code
pub fn t_lang(key: &str, language_code: Option<&str>) -> String {
    t_args_lang(key, &[], language_code)
}

/// Localized message with string arguments for the agent's Telegram language code
pub fn t_args_lang(key: &str, args: &[(&str, &str)], language_code: Option<&str>) -> String {
    let Some(manager) = get_localization_manager() else {
        return format!("Missing translation: {}", key);
    };
    let args_map: HashMap<&str, &str> = args.iter().cloned().collect();
    let args = (!args_map.is_empty()).then_some(&args_map);
    manager.get_message_in_language(key, detect_language(language_code), args)
}
