//! One-shot commands that print to stdout instead of drawing the TUI.

use std::io::Write;

use anyhow::{bail, Context, Result};
use findor_core::docs::{Catalog, Language};
use findor_core::{ApiKey, Session};
use findor_service::KeyService;
use tracing::debug;

pub async fn run_keys(
    command: &crate::config::KeysCommand,
    session: &Session,
    service: &dyn KeyService,
    out: &mut impl Write,
) -> Result<()> {
    use crate::config::KeysCommand;

    let Some(email) = session.email() else {
        bail!("no signed-in user; pass --email or set FINDOR_EMAIL");
    };

    match command {
        KeysCommand::List => {
            let items = service
                .list_api_keys(email)
                .await
                .context("failed to fetch API keys")?;
            let keys = ApiKey::from_list(items);
            if keys.is_empty() {
                writeln!(out, "You haven't created any API keys yet.")?;
            }
            for key in &keys {
                writeln!(
                    out,
                    "{:<12} {:<20} Created on {}",
                    key.name,
                    key.masked(),
                    key.created_on()
                )?;
            }
        }
        KeysCommand::Create { name } => {
            let name = name.trim();
            if name.is_empty() {
                bail!("key name must not be empty");
            }
            if let Err(e) = service.create_user(email).await {
                debug!("create_user ignored: {e}");
            }
            let created = service
                .create_api_key(email)
                .await
                .context("failed to create API key")?;
            let key = ApiKey::from_created(name, &created);
            writeln!(out, "Created \"{}\" on {}", key.name, key.created_on())?;
            writeln!(out, "{}", key.secret)?;
            writeln!(
                out,
                "This is the only time you will see it. Please copy and store it in a secure place."
            )?;
        }
        KeysCommand::Delete { secret } => {
            service
                .delete_api_key(email, secret)
                .await
                .context("failed to delete API key")?;
            writeln!(out, "Deleted {}", findor_core::mask_secret(secret))?;
        }
    }
    Ok(())
}

pub fn run_docs(
    command: &crate::config::DocsCommand,
    catalog: &Catalog,
    out: &mut impl Write,
) -> Result<()> {
    use crate::config::DocsCommand;

    match command {
        DocsCommand::List { search } => {
            let term = search.as_deref().unwrap_or_default();
            let groups = catalog.filter_groups(term);
            if groups.is_empty() {
                writeln!(out, "No results found for \"{term}\".")?;
            }
            for group in &groups {
                writeln!(out, "{}", group.group)?;
                for ep in &group.endpoints {
                    writeln!(out, "  {:<7}{:<22}{}", ep.method.as_str(), ep.id, ep.path)?;
                }
            }
        }
        DocsCommand::Show { id, lang } => {
            let Some(endpoint) = catalog.find(id) else {
                bail!("Endpoint Not Found: {id}");
            };
            let language = Language::parse_str(lang)
                .with_context(|| format!("unknown language {lang:?}"))?;

            writeln!(out, "{}", endpoint.title)?;
            writeln!(out, "{} {}", endpoint.method, endpoint.path)?;
            writeln!(out)?;
            writeln!(out, "{}", endpoint.description)?;
            if !endpoint.parameters.body.is_empty() {
                writeln!(out)?;
                writeln!(out, "Body Parameters")?;
                for p in &endpoint.parameters.body {
                    let required = if p.required { "required" } else { "optional" };
                    writeln!(out, "  {} ({}, {required}) {}", p.name, p.type_name, p.description)?;
                }
            }
            if let Some(example) = endpoint.example(language) {
                writeln!(out)?;
                writeln!(out, "{}", example.code)?;
            }
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::DocsCommand;

    fn render(cmd: DocsCommand) -> Result<String> {
        let catalog = Catalog::builtin().unwrap();
        let mut out = Vec::new();
        run_docs(&cmd, &catalog, &mut out)?;
        Ok(String::from_utf8(out).unwrap())
    }

    #[test]
    fn list_shows_every_endpoint() {
        let text = render(DocsCommand::List { search: None }).unwrap();
        assert!(text.starts_with("API\n"));
        assert!(text.contains("health-check"));
        assert!(text.contains("citation-scraper"));
    }

    #[test]
    fn list_with_no_match() {
        let text = render(DocsCommand::List {
            search: Some("zzzz".into()),
        })
        .unwrap();
        assert_eq!(text.trim(), "No results found for \"zzzz\".");
    }

    #[test]
    fn show_prints_snippet_in_requested_language() {
        let text = render(DocsCommand::Show {
            id: "web-search".into(),
            lang: "python".into(),
        })
        .unwrap();
        assert!(text.contains("POST"));
        assert!(text.contains("Body Parameters"));
        assert!(text.contains("import requests"));
    }

    #[test]
    fn show_unknown_endpoint_fails() {
        let err = render(DocsCommand::Show {
            id: "nope".into(),
            lang: "curl".into(),
        })
        .unwrap_err();
        assert!(err.to_string().contains("Endpoint Not Found"));
    }
}
