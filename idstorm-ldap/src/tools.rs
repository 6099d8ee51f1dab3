//! Client tool discovery

use crate::errors::LdapError;
use idstorm_config::LdapConfig;
use std::path::{Path, PathBuf};

/// Resolve `program` like a shell would: paths as given, bare names via `PATH`
pub fn find_in_path(program: &str) -> Option<PathBuf> {
    if program.contains(std::path::MAIN_SEPARATOR) {
        let path = Path::new(program);
        return path.is_file().then(|| path.to_path_buf());
    }

    let paths = std::env::var_os("PATH")?;
    std::env::split_paths(&paths)
        .map(|dir| dir.join(program))
        .find(|candidate| candidate.is_file())
}

/// Fail before the run if any client tool is missing
pub fn check_tools(config: &LdapConfig) -> Result<(), LdapError> {
    for tool in [&config.ldapadd, &config.ldapmodify, &config.ldapdelete] {
        if find_in_path(tool).is_none() {
            return Err(LdapError::ToolNotFound(tool.clone()));
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_explicit_path() {
        let dir = tempfile::tempdir().unwrap();
        let tool = dir.path().join("ldapadd");
        std::fs::write(&tool, "#!/bin/sh\n").unwrap();

        assert_eq!(find_in_path(tool.to_str().unwrap()), Some(tool.clone()));
        assert!(find_in_path(dir.path().join("missing").to_str().unwrap()).is_none());
    }

    #[test]
    fn test_missing_tool_is_reported() {
        let config = LdapConfig {
            ldapadd: "idstorm-no-such-ldapadd".to_string(),
            ..Default::default()
        };
        let err = check_tools(&config).unwrap_err();
        assert!(err.to_string().contains("idstorm-no-such-ldapadd"));
    }
}
