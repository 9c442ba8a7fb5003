//! Capability negotiation.
//!
//! The client declares its optional protocol features once, in the
//! `initialize` request. The three flags the server cares about are recorded
//! here and stay fixed for the rest of the process lifetime; everything else
//! in the handshake is answered by [`server_capabilities`].
//!
//! A missing or malformed capability section is treated as "unsupported" and
//! degrades behavior (for example, a single global settings value instead of
//! per-document configuration) rather than failing the handshake.

use std::sync::atomic::{AtomicBool, Ordering};

use tower_lsp::lsp_types::{
    ClientCapabilities, CompletionOptions, ServerCapabilities, TextDocumentSyncCapability,
    TextDocumentSyncKind, WorkspaceFoldersServerCapabilities, WorkspaceServerCapabilities,
};

/// Client capability flags negotiated at startup.
///
/// Written once by [`NegotiatedCapabilities::record`] during `initialize`,
/// then only read. Relaxed ordering is sufficient: the handshake completes
/// before any handler that reads the flags can run.
#[derive(Debug, Default)]
pub struct NegotiatedCapabilities {
    configuration: AtomicBool,
    workspace_folders: AtomicBool,
    related_information: AtomicBool,
}

impl NegotiatedCapabilities {
    /// Record the client's declared capability set.
    pub fn record(&self, capabilities: &ClientCapabilities) {
        let workspace = capabilities.workspace.as_ref();
        self.configuration.store(
            workspace.and_then(|it| it.configuration).unwrap_or(false),
            Ordering::Relaxed,
        );
        self.workspace_folders.store(
            workspace.and_then(|it| it.workspace_folders).unwrap_or(false),
            Ordering::Relaxed,
        );
        self.related_information.store(
            capabilities
                .text_document
                .as_ref()
                .and_then(|it| it.publish_diagnostics.as_ref())
                .and_then(|it| it.related_information)
                .unwrap_or(false),
            Ordering::Relaxed,
        );
    }

    /// Does the client answer scoped `workspace/configuration` requests?
    pub fn configuration(&self) -> bool {
        self.configuration.load(Ordering::Relaxed)
    }

    /// Does the client manage workspace folders?
    pub fn workspace_folders(&self) -> bool {
        self.workspace_folders.load(Ordering::Relaxed)
    }

    /// Does the client render related-information entries on diagnostics?
    pub fn related_information(&self) -> bool {
        self.related_information.load(Ordering::Relaxed)
    }
}

/// The server side of the handshake: incremental sync and completion with a
/// resolve step, plus workspace-folder support when the client declared it.
pub fn server_capabilities(negotiated: &NegotiatedCapabilities) -> ServerCapabilities {
    let workspace = negotiated
        .workspace_folders()
        .then(|| WorkspaceServerCapabilities {
            workspace_folders: Some(WorkspaceFoldersServerCapabilities {
                supported: Some(true),
                change_notifications: None,
            }),
            file_operations: None,
        });

    ServerCapabilities {
        text_document_sync: Some(TextDocumentSyncCapability::Kind(
            TextDocumentSyncKind::INCREMENTAL,
        )),
        completion_provider: Some(CompletionOptions {
            resolve_provider: Some(true),
            ..Default::default()
        }),
        workspace,
        ..Default::default()
    }
}

#[cfg(test)]
mod tests {
    use tower_lsp::lsp_types::{
        PublishDiagnosticsClientCapabilities, TextDocumentClientCapabilities,
        WorkspaceClientCapabilities,
    };

    use super::*;

    fn full_client_capabilities() -> ClientCapabilities {
        ClientCapabilities {
            workspace: Some(WorkspaceClientCapabilities {
                configuration: Some(true),
                workspace_folders: Some(true),
                ..Default::default()
            }),
            text_document: Some(TextDocumentClientCapabilities {
                publish_diagnostics: Some(PublishDiagnosticsClientCapabilities {
                    related_information: Some(true),
                    ..Default::default()
                }),
                ..Default::default()
            }),
            ..Default::default()
        }
    }

    #[test]
    fn empty_capability_set_negotiates_everything_off() {
        let negotiated = NegotiatedCapabilities::default();
        negotiated.record(&ClientCapabilities::default());

        assert!(!negotiated.configuration());
        assert!(!negotiated.workspace_folders());
        assert!(!negotiated.related_information());
    }

    #[test]
    fn declared_capabilities_are_recorded() {
        let negotiated = NegotiatedCapabilities::default();
        negotiated.record(&full_client_capabilities());

        assert!(negotiated.configuration());
        assert!(negotiated.workspace_folders());
        assert!(negotiated.related_information());
    }

    #[test]
    fn workspace_folder_support_is_advertised_only_when_declared() {
        let negotiated = NegotiatedCapabilities::default();
        negotiated.record(&ClientCapabilities::default());
        assert!(server_capabilities(&negotiated).workspace.is_none());

        negotiated.record(&full_client_capabilities());
        let capabilities = server_capabilities(&negotiated);
        let folders = capabilities
            .workspace
            .and_then(|it| it.workspace_folders)
            .and_then(|it| it.supported);
        assert_eq!(folders, Some(true));
    }

    #[test]
    fn completion_is_advertised_with_resolve() {
        let negotiated = NegotiatedCapabilities::default();
        let capabilities = server_capabilities(&negotiated);

        assert_eq!(
            capabilities
                .completion_provider
                .and_then(|it| it.resolve_provider),
            Some(true)
        );
        assert!(matches!(
            capabilities.text_document_sync,
            Some(TextDocumentSyncCapability::Kind(
                TextDocumentSyncKind::INCREMENTAL
            ))
        ));
    }
}
