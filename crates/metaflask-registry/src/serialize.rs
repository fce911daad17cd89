//! Plain-data views of registry entities for transport.
//!
//! Field names are part of the public JSON format and must not change.

use serde::Serialize;
use serde_json::Value;

use crate::error::RegistryResult;
use crate::index::MemberIndex;
use crate::package::{DownloadStats, Release};
use crate::person::{Member, Person};
use crate::project::{ExtensionStatus, Project, ProjectLead};
use crate::tree::SponsorTree;

#[derive(Debug, Serialize)]
pub struct PersonData<'a> {
    pub is_member: bool,
    pub github: Option<&'a str>,
    pub name: Option<&'a str>,
    pub twitter: Option<String>,
    pub email: Option<&'a str>,
    pub description: &'a str,
}

#[derive(Debug, Serialize)]
pub struct MemberCompact<'a> {
    pub num: u32,
    pub id: &'a str,
    pub name: Option<&'a str>,
    pub is_member: bool,
}

#[derive(Debug, Serialize)]
pub struct MemberData<'a> {
    #[serde(flatten)]
    pub person: PersonData<'a>,
    pub num: u32,
    pub id: &'a str,
    pub sponsor: Option<MemberCompact<'a>>,
}

#[derive(Debug, Serialize)]
pub struct ExtensionStatusData {
    pub is_approved: bool,
}

#[derive(Debug, Serialize)]
#[serde(untagged)]
pub enum LeadData<'a> {
    Member(MemberData<'a>),
    Person(PersonData<'a>),
}

#[derive(Debug, Serialize)]
pub struct ProjectCompact<'a> {
    pub internal_name: &'a str,
    pub name: Option<&'a str>,
    pub github: Option<&'a str>,
    pub is_extension: bool,
    pub latest_release: Option<&'a str>,
    pub pypi: Option<&'a str>,
    pub stewards: Vec<MemberCompact<'a>>,
}

#[derive(Debug, Serialize)]
pub struct ProjectData<'a> {
    pub internal_name: &'a str,
    pub name: Option<&'a str>,
    pub website: Option<&'a str>,
    pub github: Option<&'a str>,
    pub bugtracker: Option<&'a str>,
    pub documentation: Option<&'a str>,
    pub pypi: Option<&'a str>,
    pub pypi_url: Option<String>,
    pub license: Option<&'a str>,
    pub status: Option<&'a str>,
    pub readme: Option<&'a str>,
    pub extension_status: Option<ExtensionStatusData>,
    pub is_extension: bool,
    pub project_lead: Option<LeadData<'a>>,
    pub stewards: Vec<MemberCompact<'a>>,
    pub supports_python3: bool,
    pub releases: Vec<Release>,
    pub latest_release: Option<&'a str>,
    pub download_stats: DownloadStats,
}

#[derive(Debug, Serialize)]
pub struct SponsorTreeData<'a> {
    pub sponsor: Option<MemberCompact<'a>>,
    pub sponsored: Vec<SponsorTreeData<'a>>,
}

impl<'a> From<&'a Person> for PersonData<'a> {
    fn from(person: &'a Person) -> Self {
        Self {
            is_member: false,
            github: person.github(),
            name: person.name(),
            twitter: person.twitter(),
            email: person.email(),
            description: person.description(),
        }
    }
}

impl<'a> From<&'a Member> for MemberCompact<'a> {
    fn from(member: &'a Member) -> Self {
        Self {
            num: member.num(),
            id: member.id(),
            name: member.name(),
            is_member: true,
        }
    }
}

impl<'a> MemberData<'a> {
    pub fn new(member: &'a Member, index: &'a MemberIndex) -> Self {
        let mut person = PersonData::from(member.person());
        person.is_member = true;
        Self {
            person,
            num: member.num(),
            id: member.id(),
            sponsor: index
                .sponsor_of(member)
                .map(|sponsor| MemberCompact::from(sponsor.as_ref())),
        }
    }
}

impl From<&ExtensionStatus> for ExtensionStatusData {
    fn from(status: &ExtensionStatus) -> Self {
        Self {
            is_approved: status.is_approved(),
        }
    }
}

impl<'a> ProjectCompact<'a> {
    pub fn new(project: &'a Project) -> RegistryResult<Self> {
        Ok(Self {
            internal_name: project.internal_name(),
            name: project.name()?,
            github: project.github()?,
            is_extension: project.is_extension()?,
            latest_release: project.latest_release(),
            pypi: project.pypi()?,
            stewards: compact_stewards(project),
        })
    }
}

impl<'a> ProjectData<'a> {
    pub fn new(project: &'a Project) -> RegistryResult<Self> {
        let package = project.package_info();
        let project_lead = project.project_lead()?.map(|lead| match lead {
            ProjectLead::Member(member) => LeadData::Member(MemberData::new(member, project.members())),
            ProjectLead::Person(person) => LeadData::Person(PersonData::from(person)),
        });

        Ok(Self {
            internal_name: project.internal_name(),
            name: project.name()?,
            website: project.website()?,
            github: project.github()?,
            bugtracker: project.bugtracker()?,
            documentation: project.documentation()?,
            pypi: project.pypi()?,
            pypi_url: project.pypi_url()?,
            license: project.license()?,
            status: project.status()?,
            readme: project.readme()?,
            extension_status: project.extension_status()?.map(ExtensionStatusData::from),
            is_extension: project.is_extension()?,
            project_lead,
            stewards: compact_stewards(project),
            supports_python3: package.map_or(false, |p| p.supports_python3()),
            releases: package.map(|p| p.releases()).unwrap_or_default(),
            latest_release: project.latest_release(),
            download_stats: package.map(|p| p.download_stats()).unwrap_or_default(),
        })
    }
}

impl<'a> From<&'a SponsorTree> for SponsorTreeData<'a> {
    fn from(tree: &'a SponsorTree) -> Self {
        Self {
            sponsor: tree.sponsor.as_deref().map(MemberCompact::from),
            sponsored: tree.sponsored.iter().map(SponsorTreeData::from).collect(),
        }
    }
}

fn compact_stewards(project: &Project) -> Vec<MemberCompact<'_>> {
    project
        .stewards()
        .iter()
        .map(|m| MemberCompact::from(m.as_ref()))
        .collect()
}

/// Serialize a view struct into a JSON value.
pub(crate) fn to_value<T: Serialize>(data: &T) -> Value {
    // Every view is made of strings, numbers, bools and nested views.
    serde_json::to_value(data).unwrap_or(Value::Null)
}

impl Person {
    pub fn to_json(&self) -> Value {
        to_value(&PersonData::from(self))
    }
}

impl Member {
    /// Full or compact representation. The sponsor is resolved against `index`.
    pub fn to_json(&self, index: &MemberIndex, compact: bool) -> Value {
        if compact {
            to_value(&MemberCompact::from(self))
        } else {
            to_value(&MemberData::new(self, index))
        }
    }
}

impl ExtensionStatus {
    pub fn to_json(&self) -> Value {
        to_value(&ExtensionStatusData::from(self))
    }
}

impl Project {
    /// Full or compact representation. Fails if a lazily read file is malformed.
    pub fn to_json(&self, compact: bool) -> RegistryResult<Value> {
        Ok(if compact {
            to_value(&ProjectCompact::new(self)?)
        } else {
            to_value(&ProjectData::new(self)?)
        })
    }
}

impl SponsorTree {
    pub fn to_json(&self) -> Value {
        to_value(&SponsorTreeData::from(self))
    }
}
