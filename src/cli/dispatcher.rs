use crate::api::client::{DEFAULT_TIMEOUT_SECS, PncClient};
use crate::cli::command_handlers::{ConfigHandler, ListHandler, ParamsHandler};
use crate::cli::main_types::Commands;
use crate::error::{AppError, ConfigError};
use crate::storage::config::{Config, Profile};
use crate::utils::logging::print_verbose;
use std::path::PathBuf;
use std::sync::Arc;

/// Routes parsed commands to their handlers with the resolved profile.
pub struct Dispatcher {
    config: Config,
    config_path: Option<PathBuf>,
    profile_name: String,
    /// Whether the profile was named on the command line
    explicit_profile: bool,
    token: Option<String>,
    verbose: bool,
}

impl Dispatcher {
    pub fn new(
        config: Config,
        config_path: Option<PathBuf>,
        profile: Option<String>,
        token: Option<String>,
        verbose: bool,
    ) -> Self {
        let profile_name = config.resolve_profile_name(profile.as_deref());
        print_verbose(verbose, &format!("Using profile: {}", profile_name));

        Self {
            config,
            config_path,
            profile_name,
            explicit_profile: profile.is_some(),
            token: token.filter(|token| !token.is_empty()),
            verbose,
        }
    }

    pub async fn dispatch(&mut self, command: Commands) -> Result<(), AppError> {
        match command {
            Commands::List(args) => {
                let profile = self.active_profile()?;
                let client = self.create_client(&profile)?;
                ListHandler::new()
                    .handle(args, client, &profile, self.verbose)
                    .await
            }
            Commands::Params {
                search,
                component,
                key,
            } => ParamsHandler::new().handle(&search, component.as_deref(), key.as_deref()),
            Commands::Config { command } => ConfigHandler::new().handle(
                command,
                &mut self.config,
                self.config_path.clone(),
                &self.profile_name,
                self.verbose,
            ),
        }
    }

    /// A profile named with `--profile` must exist; the implicit one falls
    /// back to built-in defaults.
    fn active_profile(&self) -> Result<Profile, ConfigError> {
        match self.config.get_profile(&self.profile_name) {
            Some(profile) => Ok(profile.clone()),
            None if self.explicit_profile => Err(ConfigError::ProfileNotFound {
                name: self.profile_name.clone(),
            }),
            None => {
                print_verbose(
                    self.verbose,
                    &format!("Profile '{}' not configured, using defaults", self.profile_name),
                );
                Ok(Profile::default())
            }
        }
    }

    fn create_client(&self, profile: &Profile) -> Result<Arc<PncClient>, AppError> {
        let timeout = profile.timeout_seconds.unwrap_or(DEFAULT_TIMEOUT_SECS);
        let mut client = PncClient::with_timeout(profile.url.clone(), timeout)?;
        if let Some(token) = &self.token {
            client.set_token(token.clone());
        }
        print_verbose(
            self.verbose,
            &format!(
                "Connecting to {} (timeout {}s, authenticated: {})",
                client.base_url,
                timeout,
                client.is_authenticated()
            ),
        );
        Ok(Arc::new(client))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_explicit_missing_profile_is_an_error() {
        let dispatcher = Dispatcher::new(
            Config::default(),
            None,
            Some("prod".to_string()),
            None,
            false,
        );
        assert!(matches!(
            dispatcher.active_profile(),
            Err(ConfigError::ProfileNotFound { .. })
        ));
    }

    #[test]
    fn test_implicit_profile_falls_back_to_defaults() {
        let dispatcher = Dispatcher::new(Config::default(), None, None, None, false);
        assert_eq!(dispatcher.active_profile().unwrap(), Profile::default());
    }

    #[test]
    fn test_empty_token_is_ignored() {
        let dispatcher =
            Dispatcher::new(Config::default(), None, None, Some(String::new()), false);
        let client = dispatcher
            .create_client(&Profile::default())
            .expect("client");
        assert!(!client.is_authenticated());
    }
}
