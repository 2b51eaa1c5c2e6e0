use crate::api::client::PncClient;
use crate::api::models::Page;
use crate::cli::main_types::{ConfigCommands, ListArgs};
use crate::core::filtering::{FilteringBinder, parse_filter};
use crate::core::history::{Location, MemoryHistory, Navigator};
use crate::core::list_query::{ListQueryEffect, MandatoryParams, RequestConfig};
use crate::core::pagination::{DEFAULT_PAGE_SIZE, PaginationBinder, page_info};
use crate::core::push::push_handler;
use crate::core::query_params::{
    get_component_query_param_value, get_component_query_params_object,
};
use crate::core::service_container::ServiceContainer;
use crate::core::services::{ListService, Resource, RestListService};
use crate::core::sorting::{SortDirection, SortSpec, SortingBinder};
use crate::display::{TableDisplay, use_colors};
use crate::error::{AppError, CliError, StorageError};
use crate::storage::config::{Config, Profile};
use crate::utils::logging::print_verbose;
use crate::utils::retry::{RetryConfig, RetryExecutor};
use crate::utils::validation::validate_component_id;
use serde_json::Value;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

/// Requests answered faster than this never show a loading line.
const LOADING_DELAY: Duration = Duration::from_millis(300);

/// Result of one `list` invocation.
#[derive(Debug, Clone)]
pub struct ListOutcome {
    pub resource: Resource,
    pub page: Page<Value>,
    /// Location after defaults and user choices were written
    pub location: Location,
}

#[derive(Default)]
pub struct ListHandler;

impl ListHandler {
    pub fn new() -> Self {
        Self
    }

    pub async fn handle(
        &self,
        args: ListArgs,
        client: Arc<PncClient>,
        profile: &Profile,
        verbose: bool,
    ) -> Result<(), AppError> {
        let default_page_size = profile.page_size.unwrap_or(DEFAULT_PAGE_SIZE);
        let outcome = self.fetch(&args, client, default_page_size, verbose).await?;

        let display = TableDisplay::new().with_colors(use_colors());
        println!(
            "{}",
            display.render_page(&outcome.page, outcome.resource.columns())?
        );
        println!("{}", page_info(&outcome.page));
        println!("URL: {}", outcome.location.href());
        Ok(())
    }

    /// Resolve the list's URL state and fetch the page it describes.
    ///
    /// Missing pagination and sort parameters are filled in first, replacing
    /// the initial history entry; explicit choices from `args` are then
    /// applied as user navigation.
    pub async fn fetch(
        &self,
        args: &ListArgs,
        client: Arc<PncClient>,
        default_page_size: u32,
        verbose: bool,
    ) -> Result<ListOutcome, AppError> {
        let resource: Resource = args.resource.parse()?;
        let component = args.component.as_deref().filter(|id| !id.is_empty());
        if let Some(id) = component {
            validate_component_id(id).map_err(CliError::InvalidArguments)?;
        }

        let history = MemoryHistory::new(Location::new(
            format!("/{}", resource.name()),
            args.search.as_str(),
        ));
        let pagination = PaginationBinder::new(component).with_page_size(default_page_size);
        let sorting = SortingBinder::new(component, resource.sort_options())
            .with_default(resource.default_sort());

        pagination.sync(&history);
        sorting.sync(&history);
        apply_list_choices(args, resource, component, &history, &pagination, &sorting)?;

        let location = history.location();
        print_verbose(
            verbose,
            &format!("Resolved location: {}", location.href()),
        );

        let container = ServiceContainer::<Page<Value>>::with_initial_delay(LOADING_DELAY);
        let indicator = spawn_loading_indicator(&container, resource);
        let service = Arc::new(RestListService::new(client, resource));
        let retry = RetryConfig::with_max_attempts(args.retries);

        let mut effect = ListQueryEffect::new(
            |config: RequestConfig| {
                let container = container.clone();
                let service = Arc::clone(&service);
                let retry = retry.clone();
                async move {
                    RetryExecutor::new(retry)
                        .execute(|| container.run(service.list(config.clone())))
                        .await
                }
            },
            component,
            MandatoryParams::default(),
        );

        let request = effect.on_location_change(&location.search).ok_or_else(|| {
            CliError::InvalidArguments(format!(
                "'{}' does not describe a complete list request",
                location.search
            ))
        })?;
        let result = request.await;
        if let Some(indicator) = indicator {
            indicator.abort();
        }
        let page = result?;
        print_verbose(
            verbose,
            &format!("Fetched {} of {} {}", page.content.len(), page.total_hits, resource),
        );

        if let Some(path) = &args.updates {
            let applied = apply_updates(path, &container, resource)?;
            print_verbose(verbose, &format!("Applied {} push messages", applied));
        }

        Ok(ListOutcome {
            resource,
            page: container.data().unwrap_or(page),
            location,
        })
    }
}

/// Write the sort, filter and paging choices given on the command line.
fn apply_list_choices(
    args: &ListArgs,
    resource: Resource,
    component: Option<&str>,
    history: &dyn Navigator,
    pagination: &PaginationBinder,
    sorting: &SortingBinder,
) -> Result<(), CliError> {
    if let Some(sort) = &args.sort {
        let spec = parse_sort_arg(sort, resource)?;
        sorting.sort_by(&spec, history);
    }

    if let Some(query) = &args.query {
        let clauses = parse_filter(query);
        if clauses.is_empty() && !query.trim().is_empty() {
            return Err(CliError::InvalidArguments(format!(
                "'{}' contains no valid filter clause",
                query
            )));
        }
        let filtering = FilteringBinder::new(component);
        filtering.clear(history);
        for clause in clauses {
            filtering.add(clause, history);
        }
    }

    // page index goes last: the other choices reset it to 1
    if let Some(size) = args.page_size {
        if size == 0 {
            return Err(CliError::InvalidArguments(
                "--page-size must be at least 1".to_string(),
            ));
        }
        pagination.set_page_size(size, history);
    }
    if let Some(page) = args.page {
        if page == 0 {
            return Err(CliError::InvalidArguments(
                "--page starts at 1".to_string(),
            ));
        }
        pagination.go_to_page(page, history);
    }
    Ok(())
}

/// `none`, `attribute`, `attribute:asc|desc` or the wire form `=desc=attribute`.
pub fn parse_sort_arg(value: &str, resource: Resource) -> Result<SortSpec, CliError> {
    let invalid = |reason: String| CliError::InvalidArguments(format!("--sort '{}': {}", value, reason));

    let spec = if value.starts_with('=') || value == "none" {
        SortSpec::parse(value).ok_or_else(|| invalid("malformed sort".to_string()))?
    } else {
        match value.split_once(':') {
            Some((attribute, direction)) => {
                SortSpec::new(attribute, direction.parse::<SortDirection>().map_err(invalid)?)
            }
            None => SortSpec::asc(value),
        }
    };

    if spec.is_sorted()
        && !resource
            .sort_options()
            .iter()
            .any(|option| option.id == spec.attribute)
    {
        let sortable: Vec<String> = resource
            .sort_options()
            .into_iter()
            .map(|option| option.id)
            .collect();
        return Err(invalid(format!(
            "{} can be sorted by {}",
            resource,
            sortable.join(", ")
        )));
    }
    Ok(spec)
}

/// Feed a JSON-lines file of push messages into the list's container.
fn apply_updates(
    path: &Path,
    container: &ServiceContainer<Page<Value>>,
    resource: Resource,
) -> Result<usize, AppError> {
    let content = std::fs::read_to_string(path).map_err(|source| StorageError::FileIo {
        path: path.to_string_lossy().to_string(),
        source,
    })?;

    let handler = push_handler(container.clone(), resource.push_key());
    let mut applied = 0;
    for (number, line) in content.lines().enumerate() {
        if line.trim().is_empty() {
            continue;
        }
        let message: Value = serde_json::from_str(line).map_err(|e| {
            CliError::InvalidArguments(format!("{}:{}: {}", path.display(), number + 1, e))
        })?;
        handler(message);
        applied += 1;
    }
    Ok(applied)
}

fn spawn_loading_indicator(
    container: &ServiceContainer<Page<Value>>,
    resource: Resource,
) -> Option<tokio::task::JoinHandle<()>> {
    if !atty::is(atty::Stream::Stderr) {
        return None;
    }
    let mut states = container.subscribe();
    Some(tokio::spawn(async move {
        while states.changed().await.is_ok() {
            if states.borrow_and_update().loading {
                eprintln!("Loading {}...", resource);
                break;
            }
        }
    }))
}

#[derive(Default)]
pub struct ParamsHandler;

impl ParamsHandler {
    pub fn new() -> Self {
        Self
    }

    pub fn handle(
        &self,
        search: &str,
        component: Option<&str>,
        key: Option<&str>,
    ) -> Result<(), AppError> {
        let component = component.filter(|id| !id.is_empty());
        if let Some(id) = component {
            validate_component_id(id).map_err(CliError::InvalidArguments)?;
        }

        match key {
            Some(key) => match get_component_query_param_value(search, key, component) {
                Some(value) => println!("{}", value),
                None => {
                    return Err(CliError::InvalidArguments(format!(
                        "'{}' is not set for this component",
                        key
                    ))
                    .into());
                }
            },
            None => {
                let params = get_component_query_params_object(search, component);
                let display = TableDisplay::new().with_colors(use_colors());
                println!("{}", display.render_params(&params));
            }
        }
        Ok(())
    }
}

#[derive(Default)]
pub struct ConfigHandler;

impl ConfigHandler {
    pub fn new() -> Self {
        Self
    }

    pub fn handle(
        &self,
        command: ConfigCommands,
        config: &mut Config,
        config_path: Option<PathBuf>,
        profile_name: &str,
        verbose: bool,
    ) -> Result<(), AppError> {
        match command {
            ConfigCommands::Show => {
                print_verbose(verbose, "Showing configuration");

                println!("Current Configuration:");
                println!("=====================");
                match &config.default_profile {
                    Some(default_profile) => println!("Default Profile: {}", default_profile),
                    None => println!("Default Profile: (not set)"),
                }

                println!("\nProfiles:");
                if config.profiles.is_empty() {
                    println!("  No profiles configured");
                }
                let mut names: Vec<&String> = config.profiles.keys().collect();
                names.sort();
                for name in names {
                    let Some(profile) = config.get_profile(name) else {
                        continue;
                    };
                    let marker = if name == profile_name { " (active)" } else { "" };
                    println!("  {}{}:", name, marker);
                    println!("    url: {}", profile.url);
                    if let Some(timeout) = profile.timeout_seconds {
                        println!("    timeout_seconds: {}", timeout);
                    }
                    if let Some(size) = profile.page_size {
                        println!("    page_size: {}", size);
                    }
                }
                Ok(())
            }
            ConfigCommands::Set { key, value } => {
                print_verbose(
                    verbose,
                    &format!("Setting {} on profile '{}'", key, profile_name),
                );

                let mut profile = config.get_profile(profile_name).cloned().unwrap_or_default();
                profile.set_field(&key, &value)?;
                config.set_profile(profile_name.to_string(), profile);
                if config.default_profile.is_none() {
                    config.default_profile = Some(profile_name.to_string());
                }
                config.save(config_path)?;

                println!("✅ Set {} = {} for profile '{}'", key, value, profile_name);
                Ok(())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ConfigError;
    use tempfile::tempdir;

    #[test]
    fn test_parse_sort_arg_forms() {
        assert_eq!(
            parse_sort_arg("submitTime:desc", Resource::Builds).unwrap(),
            SortSpec::desc("submitTime")
        );
        assert_eq!(
            parse_sort_arg("status", Resource::Builds).unwrap(),
            SortSpec::asc("status")
        );
        assert_eq!(
            parse_sort_arg("=desc=endTime", Resource::Builds).unwrap(),
            SortSpec::desc("endTime")
        );
        assert_eq!(
            parse_sort_arg("none", Resource::Builds).unwrap(),
            SortSpec::unsorted()
        );
    }

    #[test]
    fn test_parse_sort_arg_rejects_unknown_attribute() {
        let err = parse_sort_arg("color:asc", Resource::Builds).unwrap_err();
        assert!(err.to_string().contains("submitTime"));
        assert!(parse_sort_arg("status:up", Resource::Builds).is_err());
        assert!(parse_sort_arg("=sideways=status", Resource::Builds).is_err());
    }

    #[test]
    fn test_apply_list_choices_resets_then_sets_page() {
        let history = MemoryHistory::new(Location::new("/builds", "?pageIndex=4&pageSize=10"));
        let pagination = PaginationBinder::new(None);
        let sorting = SortingBinder::new(None, Resource::Builds.sort_options());
        let args = ListArgs {
            resource: "builds".to_string(),
            sort: Some("status:asc".to_string()),
            query: Some("status==FAILED".to_string()),
            page: Some(2),
            ..ListArgs::default()
        };

        apply_list_choices(&args, Resource::Builds, None, &history, &pagination, &sorting)
            .expect("choices apply");

        let search = history.location().search;
        assert_eq!(
            get_component_query_param_value(&search, "pageIndex", None).as_deref(),
            Some("2")
        );
        assert_eq!(
            get_component_query_param_value(&search, "sort", None).as_deref(),
            Some("=asc=status")
        );
        assert_eq!(
            get_component_query_param_value(&search, "q", None).as_deref(),
            Some("status==FAILED")
        );
    }

    #[test]
    fn test_apply_list_choices_rejects_garbage_query() {
        let history = MemoryHistory::new(Location::new("/builds", ""));
        let args = ListArgs {
            resource: "builds".to_string(),
            query: Some("not a filter".to_string()),
            ..ListArgs::default()
        };
        let result = apply_list_choices(
            &args,
            Resource::Builds,
            None,
            &history,
            &PaginationBinder::new(None),
            &SortingBinder::new(None, Resource::Builds.sort_options()),
        );
        assert!(matches!(result, Err(CliError::InvalidArguments(_))));
    }

    #[test]
    fn test_config_set_creates_profile_and_saves() {
        let temp_dir = tempdir().expect("Failed to create temp dir");
        let config_path = temp_dir.path().join("config.toml");
        let mut config = Config::default();

        ConfigHandler::new()
            .handle(
                ConfigCommands::Set {
                    key: "page_size".to_string(),
                    value: "25".to_string(),
                },
                &mut config,
                Some(config_path.clone()),
                "stage",
                false,
            )
            .expect("set succeeds");

        let loaded = Config::load(Some(config_path)).expect("reload");
        assert_eq!(loaded.default_profile.as_deref(), Some("stage"));
        assert_eq!(
            loaded.get_profile("stage").and_then(|p| p.page_size),
            Some(25)
        );
    }

    #[test]
    fn test_config_set_rejects_unknown_key() {
        let temp_dir = tempdir().expect("Failed to create temp dir");
        let mut config = Config::default();

        let result = ConfigHandler::new().handle(
            ConfigCommands::Set {
                key: "colour".to_string(),
                value: "red".to_string(),
            },
            &mut config,
            Some(temp_dir.path().join("config.toml")),
            "default",
            false,
        );
        assert!(matches!(
            result,
            Err(AppError::Config(ConfigError::UnknownKey { .. }))
        ));
        assert!(config.profiles.is_empty());
    }
}
