//! The tower-lsp backend.
//!
//! [`Backend`] owns all session state — negotiated capabilities, open
//! documents, cached settings — and implements the protocol handlers. Every
//! content change triggers a synchronous re-validation of the changed
//! document; the settings fetch is the only suspending step, and diagnostics
//! from two rapid edits to one document may consequently be published out of
//! order. That race is a known property of the current design, not guarded
//! against by sequencing or cancellation.

use std::path::PathBuf;

use tower_lsp::jsonrpc::Result;
use tower_lsp::lsp_types::{
    CompletionItem, CompletionParams, CompletionResponse, ConfigurationItem,
    DidChangeConfigurationParams, DidChangeTextDocumentParams, DidChangeWatchedFilesParams,
    DidChangeWorkspaceFoldersParams, DidCloseTextDocumentParams, DidOpenTextDocumentParams,
    InitializeParams, InitializeResult, InitializedParams, MessageType, Registration, ServerInfo,
    Url,
};
use tower_lsp::{Client, LanguageServer};

use crate::capabilities::{self, NegotiatedCapabilities};
use crate::completion;
use crate::config::{EffectiveSettings, SettingsCache, CONFIG_SECTION};
use crate::diagnostics;
use crate::documents::DocumentStore;

pub struct Backend {
    client: Client,
    capabilities: NegotiatedCapabilities,
    documents: DocumentStore,
    settings: SettingsCache,
}

impl Backend {
    pub fn new(client: Client, global_settings: EffectiveSettings) -> Self {
        Backend {
            client,
            capabilities: NegotiatedCapabilities::default(),
            documents: DocumentStore::default(),
            settings: SettingsCache::new(global_settings),
        }
    }

    /// Effective settings for one document: the global value when the client
    /// cannot answer scoped requests, otherwise the cached per-document
    /// value, fetched from the client on first use.
    async fn document_settings(&self, uri: &Url) -> Option<EffectiveSettings> {
        if !self.capabilities.configuration() {
            return Some(self.settings.global().await);
        }

        let client = self.client.clone();
        let scope_uri = uri.clone();
        self.settings
            .get_or_fetch(uri, move || async move {
                let items = vec![ConfigurationItem {
                    scope_uri: Some(scope_uri),
                    section: Some(CONFIG_SECTION.to_string()),
                }];
                let mut values = client.configuration(items).await?;
                let value = if values.is_empty() {
                    serde_json::Value::Null
                } else {
                    values.swap_remove(0)
                };
                Ok(EffectiveSettings::from_client_value(value))
            })
            .await
    }

    /// Re-validate one document and publish the full replacement diagnostic
    /// set for its URI.
    async fn validate(&self, uri: Url) {
        let Some(document) = self.documents.get(&uri).await else {
            return;
        };
        let Some(settings) = self.document_settings(&uri).await else {
            // The cached fetch for this document failed; it keeps stalling
            // validation until the document is closed and reopened.
            tracing::warn!(%uri, "no settings available, skipping validation");
            return;
        };

        let diagnostics = if self.capabilities.related_information() {
            diagnostics::check_with_origin(&document, &settings, &uri)
        } else {
            diagnostics::check(&document, &settings)
        };
        self.client.publish_diagnostics(uri, diagnostics, None).await;
    }

    // root_uri is deprecated in the protocol but still what most editors send.
    #[allow(deprecated)]
    fn workspace_root(params: &InitializeParams) -> Option<PathBuf> {
        params
            .workspace_folders
            .as_ref()
            .and_then(|folders| folders.first())
            .and_then(|folder| folder.uri.to_file_path().ok())
            .or_else(|| {
                params.root_uri.as_ref().and_then(|uri| uri.to_file_path().ok())
            })
    }
}

#[tower_lsp::async_trait]
impl LanguageServer for Backend {
    async fn initialize(&self, params: InitializeParams) -> Result<InitializeResult> {
        self.capabilities.record(&params.capabilities);

        let root = Self::workspace_root(&params);
        match EffectiveSettings::load(root.as_deref()) {
            Ok(settings) => self.settings.replace_global(settings).await,
            Err(err) => tracing::warn!("falling back to default settings: {err}"),
        }

        Ok(InitializeResult {
            capabilities: capabilities::server_capabilities(&self.capabilities),
            server_info: Some(ServerInfo {
                name: "mbdls".to_string(),
                version: Some(env!("CARGO_PKG_VERSION").to_string()),
            }),
        })
    }

    async fn initialized(&self, _params: InitializedParams) {
        if self.capabilities.configuration() {
            // Register for all configuration changes.
            let registration = Registration {
                id: "workspace/didChangeConfiguration".to_string(),
                method: "workspace/didChangeConfiguration".to_string(),
                register_options: None,
            };
            if let Err(err) = self.client.register_capability(vec![registration]).await {
                tracing::warn!("configuration-change registration failed: {err}");
            }
        }
        tracing::info!("server initialized");
    }

    async fn shutdown(&self) -> Result<()> {
        Ok(())
    }

    async fn did_open(&self, params: DidOpenTextDocumentParams) {
        let document = params.text_document;
        self.documents
            .open(
                document.uri.clone(),
                &document.text,
                document.version,
                &document.language_id,
            )
            .await;
        self.validate(document.uri).await;
    }

    async fn did_change(&self, params: DidChangeTextDocumentParams) {
        let uri = params.text_document.uri;
        let applied = self
            .documents
            .apply_changes(&uri, params.text_document.version, &params.content_changes)
            .await;
        if applied {
            self.validate(uri).await;
        }
    }

    async fn did_close(&self, params: DidCloseTextDocumentParams) {
        let uri = params.text_document.uri;
        self.documents.close(&uri).await;
        // Only keep settings for open documents.
        self.settings.evict(&uri).await;
    }

    async fn did_change_configuration(&self, params: DidChangeConfigurationParams) {
        if self.capabilities.configuration() {
            // Drop all cached document settings; each is re-fetched on its
            // document's next validation. Open documents keep their current
            // diagnostics until their next edit.
            self.settings.invalidate_all().await;
        } else {
            let value = params
                .settings
                .get(CONFIG_SECTION)
                .cloned()
                .unwrap_or(serde_json::Value::Null);
            self.settings
                .replace_global(EffectiveSettings::from_client_value(value))
                .await;
        }
    }

    async fn did_change_watched_files(&self, _params: DidChangeWatchedFilesParams) {
        self.client
            .log_message(MessageType::INFO, "Watched file change event received.")
            .await;
    }

    async fn did_change_workspace_folders(&self, _params: DidChangeWorkspaceFoldersParams) {
        self.client
            .log_message(MessageType::INFO, "Workspace folder change event received.")
            .await;
    }

    async fn completion(&self, _params: CompletionParams) -> Result<Option<CompletionResponse>> {
        // The cursor position and trigger context are deliberately ignored;
        // the catalog is the same everywhere.
        Ok(Some(CompletionResponse::Array(completion::static_catalog())))
    }

    async fn completion_resolve(&self, item: CompletionItem) -> Result<CompletionItem> {
        Ok(completion::resolve(item))
    }
}
