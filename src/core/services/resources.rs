//! List resources of the console and how each one is presented.

use crate::core::sorting::{SortOption, SortSpec};
use crate::error::CliError;
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Resource {
    Builds,
    Products,
    Projects,
    BuildConfigs,
    GroupConfigs,
    Artifacts,
}

impl Resource {
    pub const ALL: [Resource; 6] = [
        Resource::Builds,
        Resource::Products,
        Resource::Projects,
        Resource::BuildConfigs,
        Resource::GroupConfigs,
        Resource::Artifacts,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            Resource::Builds => "builds",
            Resource::Products => "products",
            Resource::Projects => "projects",
            Resource::BuildConfigs => "build-configs",
            Resource::GroupConfigs => "group-configs",
            Resource::Artifacts => "artifacts",
        }
    }

    /// REST path relative to the API base URL.
    pub fn path(&self) -> String {
        format!("/{}", self.name())
    }

    /// Key under which push notifications carry an item of this resource.
    pub fn push_key(&self) -> &'static str {
        match self {
            Resource::Builds => "build",
            Resource::Products => "product",
            Resource::Projects => "project",
            Resource::BuildConfigs => "buildConfig",
            Resource::GroupConfigs => "groupConfig",
            Resource::Artifacts => "artifact",
        }
    }

    /// `(attribute, column title)` pairs rendered in tables.
    pub fn columns(&self) -> &'static [(&'static str, &'static str)] {
        match self {
            Resource::Builds => &[
                ("id", "ID"),
                ("status", "Status"),
                ("buildConfigRevision.name", "Build Config"),
                ("submitTime", "Submitted"),
                ("user.username", "User"),
            ],
            Resource::Products => &[
                ("id", "ID"),
                ("name", "Name"),
                ("abbreviation", "Abbreviation"),
                ("description", "Description"),
            ],
            Resource::Projects => &[
                ("id", "ID"),
                ("name", "Name"),
                ("description", "Description"),
            ],
            Resource::BuildConfigs => &[
                ("id", "ID"),
                ("name", "Name"),
                ("buildType", "Build Type"),
                ("project.name", "Project"),
                ("modificationTime", "Modified"),
            ],
            Resource::GroupConfigs => &[("id", "ID"), ("name", "Name")],
            Resource::Artifacts => &[
                ("id", "ID"),
                ("identifier", "Identifier"),
                ("artifactQuality", "Quality"),
                ("buildCategory", "Category"),
            ],
        }
    }

    pub fn sort_options(&self) -> Vec<SortOption> {
        let sortable: &[(&str, &str)] = match self {
            Resource::Builds => &[
                ("status", "Status"),
                ("submitTime", "Submitted"),
                ("startTime", "Started"),
                ("endTime", "Ended"),
            ],
            Resource::BuildConfigs => &[
                ("name", "Name"),
                ("buildType", "Build Type"),
                ("creationTime", "Created"),
                ("modificationTime", "Modified"),
            ],
            Resource::Artifacts => &[
                ("identifier", "Identifier"),
                ("artifactQuality", "Quality"),
                ("buildCategory", "Category"),
            ],
            Resource::Products | Resource::Projects | Resource::GroupConfigs => {
                &[("name", "Name")]
            }
        };
        sortable
            .iter()
            .map(|(id, title)| SortOption::new(*id, *title))
            .collect()
    }

    pub fn default_sort(&self) -> SortSpec {
        match self {
            Resource::Builds => SortSpec::desc("submitTime"),
            Resource::BuildConfigs => SortSpec::desc("modificationTime"),
            Resource::Artifacts => SortSpec::asc("identifier"),
            Resource::Products | Resource::Projects | Resource::GroupConfigs => {
                SortSpec::asc("name")
            }
        }
    }
}

impl fmt::Display for Resource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Resource {
    type Err = CliError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Resource::ALL
            .into_iter()
            .find(|resource| resource.name() == s)
            .ok_or_else(|| CliError::UnknownResource {
                name: s.to_string(),
                available: Resource::ALL.iter().map(|r| r.name().to_string()).collect(),
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resource_round_trip_by_name() {
        for resource in Resource::ALL {
            assert_eq!(resource.name().parse::<Resource>().ok(), Some(resource));
        }
        assert!(matches!(
            "milestones".parse::<Resource>(),
            Err(CliError::UnknownResource { .. })
        ));
    }

    #[test]
    fn test_default_sort_is_a_sort_option() {
        for resource in Resource::ALL {
            let default = resource.default_sort();
            assert!(
                resource
                    .sort_options()
                    .iter()
                    .any(|option| option.id == default.attribute),
                "{}",
                resource
            );
        }
    }

    #[test]
    fn test_path() {
        assert_eq!(Resource::GroupConfigs.path(), "/group-configs");
    }
}
