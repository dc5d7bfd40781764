//! Plugin lifecycle and the host registration point.
//!
//! A plugin is constructed once by the embedding application, with the host
//! services it needs passed in explicitly, and then handed to
//! [`PluginHost::install`]. Installing wires the plugin's shortcodes and
//! settings pages exactly once.

use crate::capability::Viewer;
use crate::error::{HostError, HostResult};
use crate::options::{MemoryOptionStore, OptionStore};
use crate::settings_page::SettingsPage;
use crate::shortcode::{ShortcodeAttributes, ShortcodeHandler, ShortcodeRegistry};
use crate::transient::{MemoryTransientCache, TransientCache};
use std::collections::HashMap;
use std::sync::Arc;
use tracing::info;

/// A plugin that binds to host extension points.
pub trait Plugin: Send + Sync {
    /// Unique identifier for the plugin.
    fn id(&self) -> &str;

    /// Human-readable name.
    fn name(&self) -> &str;

    /// Bind shortcodes and settings pages. Called once, on install.
    fn register(&self, hooks: &mut Hooks);

    /// Run when the plugin is activated.
    fn activate(&self) -> HostResult<()>;

    /// Run when the plugin is deactivated.
    fn deactivate(&self) -> HostResult<()>;
}

/// Extension points a plugin can bind to during registration.
#[derive(Default)]
pub struct Hooks {
    shortcodes: ShortcodeRegistry,
    pages: HashMap<String, SettingsPage>,
}

impl Hooks {
    /// Bind a shortcode tag to a handler.
    pub fn add_shortcode(&mut self, tag: impl Into<String>, handler: Arc<dyn ShortcodeHandler>) {
        self.shortcodes.register(tag, handler);
    }

    /// Add a settings page under the host's settings menu.
    pub fn add_settings_page(&mut self, page: SettingsPage) {
        self.pages.insert(page.slug.clone(), page);
    }
}

/// The host: owns storage services, installed plugins and their hooks.
pub struct PluginHost {
    options: Arc<dyn OptionStore>,
    transients: Arc<dyn TransientCache>,
    plugins: HashMap<String, Arc<dyn Plugin>>,
    hooks: Hooks,
}

impl PluginHost {
    /// Create a host on top of the given storage services.
    pub fn new(options: Arc<dyn OptionStore>, transients: Arc<dyn TransientCache>) -> Self {
        Self {
            options,
            transients,
            plugins: HashMap::new(),
            hooks: Hooks::default(),
        }
    }

    /// Create a host backed by in-memory storage.
    pub fn in_memory() -> Self {
        Self::new(
            Arc::new(MemoryOptionStore::new()),
            Arc::new(MemoryTransientCache::new()),
        )
    }

    /// Shared handle to the option store, for constructing plugins.
    pub fn options(&self) -> Arc<dyn OptionStore> {
        Arc::clone(&self.options)
    }

    /// Shared handle to the transient cache, for constructing plugins.
    pub fn transients(&self) -> Arc<dyn TransientCache> {
        Arc::clone(&self.transients)
    }

    /// Install a plugin and run its registration.
    pub fn install(&mut self, plugin: Arc<dyn Plugin>) -> HostResult<()> {
        let id = plugin.id().to_string();
        if self.plugins.contains_key(&id) {
            return Err(HostError::AlreadyInstalled(id));
        }

        plugin.register(&mut self.hooks);
        info!("Installed plugin: {} ({})", plugin.name(), id);
        self.plugins.insert(id, plugin);
        Ok(())
    }

    /// IDs of installed plugins.
    pub fn plugins(&self) -> Vec<&str> {
        self.plugins.keys().map(String::as_str).collect()
    }

    fn plugin(&self, id: &str) -> HostResult<&Arc<dyn Plugin>> {
        self.plugins
            .get(id)
            .ok_or_else(|| HostError::PluginNotFound(id.to_string()))
    }

    /// Run a plugin's activation hook.
    pub fn activate(&self, id: &str) -> HostResult<()> {
        self.plugin(id)?.activate()?;
        info!("Activated plugin: {}", id);
        Ok(())
    }

    /// Run a plugin's deactivation hook.
    pub fn deactivate(&self, id: &str) -> HostResult<()> {
        self.plugin(id)?.deactivate()?;
        info!("Deactivated plugin: {}", id);
        Ok(())
    }

    /// Expand all registered shortcodes in `content`.
    pub async fn render_content(&self, content: &str) -> String {
        self.hooks.shortcodes.expand(content).await
    }

    /// Render a single shortcode. `None` if the tag is not registered.
    pub async fn render_shortcode(
        &self,
        tag: &str,
        attributes: &ShortcodeAttributes,
    ) -> Option<String> {
        self.hooks.shortcodes.render(tag, attributes).await
    }

    /// Look up a registered settings page.
    pub fn settings_page(&self, slug: &str) -> HostResult<&SettingsPage> {
        self.hooks
            .pages
            .get(slug)
            .ok_or_else(|| HostError::PageNotFound(slug.to_string()))
    }

    /// Render a settings page for `viewer`. `None` if the viewer may not see it.
    pub fn render_settings_page(&self, slug: &str, viewer: &Viewer) -> HostResult<Option<String>> {
        self.settings_page(slug)?.render(viewer, self.options.as_ref())
    }

    /// Submit a settings page form on behalf of `viewer`.
    pub fn submit_settings_page(
        &self,
        slug: &str,
        viewer: &Viewer,
        form: &HashMap<String, String>,
    ) -> HostResult<usize> {
        self.settings_page(slug)?
            .submit(viewer, self.options.as_ref(), form)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::capability::Capability;
    use crate::settings_page::{SettingsField, SettingsSection};
    use async_trait::async_trait;

    struct Hello;

    #[async_trait]
    impl ShortcodeHandler for Hello {
        async fn render(&self, attributes: &ShortcodeAttributes) -> String {
            format!("Hello, {}!", attributes.get("name").unwrap_or("world"))
        }
    }

    struct HelloPlugin {
        options: Arc<dyn OptionStore>,
    }

    impl Plugin for HelloPlugin {
        fn id(&self) -> &str {
            "hello"
        }

        fn name(&self) -> &str {
            "Hello Plugin"
        }

        fn register(&self, hooks: &mut Hooks) {
            hooks.add_shortcode("hello", Arc::new(Hello));
            hooks.add_settings_page(
                SettingsPage::new("hello", "Hello", "Hello", Capability::ManageOptions).section(
                    SettingsSection::new("main", "Main")
                        .field(SettingsField::new("hello_greeting", "Greeting")),
                ),
            );
        }

        fn activate(&self) -> HostResult<()> {
            self.options.add("hello_greeting", "hi")?;
            Ok(())
        }

        fn deactivate(&self) -> HostResult<()> {
            self.options.delete("hello_greeting")?;
            Ok(())
        }
    }

    fn host() -> PluginHost {
        let mut host = PluginHost::in_memory();
        let plugin = HelloPlugin {
            options: host.options(),
        };
        host.install(Arc::new(plugin)).unwrap();
        host
    }

    #[test]
    fn test_install_twice_fails() {
        let mut host = host();
        let again = HelloPlugin {
            options: host.options(),
        };
        let result = host.install(Arc::new(again));
        assert!(matches!(result, Err(HostError::AlreadyInstalled(id)) if id == "hello"));
        assert_eq!(host.plugins(), ["hello"]);
    }

    #[test]
    fn test_lifecycle_hooks() {
        let host = host();
        host.activate("hello").unwrap();
        assert_eq!(host.options().get("hello_greeting").unwrap().as_deref(), Some("hi"));

        host.deactivate("hello").unwrap();
        assert_eq!(host.options().get("hello_greeting").unwrap(), None);

        assert!(matches!(host.activate("missing"), Err(HostError::PluginNotFound(_))));
    }

    #[tokio::test]
    async fn test_render_content() {
        let host = host();
        let out = host.render_content(r#"<p>[hello name="Ada"]</p>"#).await;
        assert_eq!(out, "<p>Hello, Ada!</p>");
    }

    #[test]
    fn test_settings_page_lookup() {
        let host = host();
        assert!(host.settings_page("hello").is_ok());
        assert!(matches!(host.settings_page("nope"), Err(HostError::PageNotFound(_))));

        let html = host
            .render_settings_page("hello", &Viewer::administrator("root"))
            .unwrap();
        assert!(html.is_some());
    }
}
