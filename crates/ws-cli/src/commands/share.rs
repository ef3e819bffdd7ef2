//! `ws share`, `ws permissions` and `ws revoke` command implementations.

use clap::Args;
use ws_core::Provider;
use ws_local::permission_id;

use super::GlobalArgs;
use crate::error::CliError;
use crate::output::Output;

/// Arguments for the share command.
#[derive(Args)]
pub(crate) struct ShareArgs {
    /// Document id.
    id: String,

    /// Email to share with.
    email: String,

    /// Role to grant.
    #[arg(short, long, default_value = "reader")]
    role: String,
}

impl ShareArgs {
    pub(crate) fn execute(&self, global: &GlobalArgs) -> Result<(), CliError> {
        share(&global.open_provider()?, self, &Output::new())
    }
}

fn share(provider: &dyn Provider, args: &ShareArgs, output: &Output) -> Result<(), CliError> {
    provider.share_file(&args.id, &args.email, &args.role)?;
    output.success(&format!(
        "Shared {} with {} as {}",
        args.id, args.email, args.role
    ));
    output.data(&permission_id(&args.email));
    Ok(())
}

/// Arguments for the permissions command.
#[derive(Args)]
pub(crate) struct PermissionsArgs {
    /// Document id.
    id: String,
}

impl PermissionsArgs {
    pub(crate) fn execute(self, global: &GlobalArgs) -> Result<(), CliError> {
        let provider = global.open_provider()?;
        let output = Output::new();
        let permissions = provider.list_permissions(&self.id)?;
        if permissions.is_empty() {
            output.info(&format!("{} is not shared", self.id));
        }
        for perm in permissions {
            output.data(&format!(
                "{}\t{}\t{}\t{}",
                perm.id, perm.kind, perm.role, perm.email_address
            ));
        }
        Ok(())
    }
}

/// Arguments for the revoke command.
#[derive(Args)]
pub(crate) struct RevokeArgs {
    /// Document id.
    id: String,

    /// Permission id, or the email it was granted to.
    permission: String,
}

impl RevokeArgs {
    pub(crate) fn execute(&self, global: &GlobalArgs) -> Result<(), CliError> {
        revoke(&global.open_provider()?, self, &Output::new())
    }
}

fn revoke(provider: &dyn Provider, args: &RevokeArgs, output: &Output) -> Result<(), CliError> {
    let id = if args.permission.contains('@') {
        permission_id(&args.permission)
    } else {
        args.permission.clone()
    };
    provider.delete_permission(&args.id, &id)?;
    output.success(&format!("Revoked {} on {}", args.permission, args.id));
    Ok(())
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use pretty_assertions::assert_eq;
    use ws_core::{DocumentCreate, DocumentStorage};
    use ws_local::{LocalAdapter, LocalConfig, LocalProvider};

    use super::*;

    #[test]
    fn test_share_and_revoke_by_email() {
        let temp_dir = tempfile::tempdir().unwrap();
        let adapter = LocalAdapter::new(LocalConfig::new(temp_dir.path())).unwrap();
        let doc = adapter
            .create_document(DocumentCreate {
                name: "RFC-1".to_owned(),
                parent_folder_id: "docs".to_owned(),
                ..Default::default()
            })
            .unwrap();
        let provider = LocalProvider::new(Arc::new(adapter));
        let output = Output::new();

        share(
            &provider,
            &ShareArgs {
                id: doc.id.clone(),
                email: "bob@example.com".to_owned(),
                role: "writer".to_owned(),
            },
            &output,
        )
        .unwrap();
        assert_eq!(provider.list_permissions(&doc.id).unwrap().len(), 1);

        revoke(
            &provider,
            &RevokeArgs {
                id: doc.id.clone(),
                permission: "bob@example.com".to_owned(),
            },
            &output,
        )
        .unwrap();
        assert!(provider.list_permissions(&doc.id).unwrap().is_empty());

        let err = revoke(
            &provider,
            &RevokeArgs {
                id: doc.id,
                permission: permission_id("bob@example.com"),
            },
            &output,
        )
        .unwrap_err();
        assert!(matches!(err, CliError::Workspace(_)));
    }
}
