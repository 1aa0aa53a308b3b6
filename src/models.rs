//! Data models for the salary dashboard.
//!
//! This module contains the record shape loaded from the dataset, the
//! closed categorical sets it uses, and the field addressing used by
//! filters and group-by operations.

use crate::error::ConfigurationError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Experience level of the employee.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum ExperienceLevel {
    /// Entry-level / junior
    #[serde(rename = "EN")]
    Entry,
    /// Mid-level / intermediate
    #[serde(rename = "MI")]
    Mid,
    /// Senior-level / expert
    #[serde(rename = "SE")]
    Senior,
    /// Executive-level / director
    #[serde(rename = "EX")]
    Executive,
}

impl ExperienceLevel {
    /// Dataset code for this level.
    pub fn code(&self) -> &'static str {
        match self {
            ExperienceLevel::Entry => "EN",
            ExperienceLevel::Mid => "MI",
            ExperienceLevel::Senior => "SE",
            ExperienceLevel::Executive => "EX",
        }
    }

    /// Parse a dataset code.
    pub fn from_code(code: &str) -> Option<Self> {
        match code {
            "EN" => Some(ExperienceLevel::Entry),
            "MI" => Some(ExperienceLevel::Mid),
            "SE" => Some(ExperienceLevel::Senior),
            "EX" => Some(ExperienceLevel::Executive),
            _ => None,
        }
    }

    /// Human readable name.
    pub fn display_name(&self) -> &'static str {
        match self {
            ExperienceLevel::Entry => "Entry-level",
            ExperienceLevel::Mid => "Mid-level",
            ExperienceLevel::Senior => "Senior",
            ExperienceLevel::Executive => "Executive",
        }
    }
}

/// Employment arrangement.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum EmploymentType {
    #[serde(rename = "FT")]
    FullTime,
    #[serde(rename = "PT")]
    PartTime,
    #[serde(rename = "CT")]
    Contract,
    #[serde(rename = "FL")]
    Freelance,
}

impl EmploymentType {
    pub fn code(&self) -> &'static str {
        match self {
            EmploymentType::FullTime => "FT",
            EmploymentType::PartTime => "PT",
            EmploymentType::Contract => "CT",
            EmploymentType::Freelance => "FL",
        }
    }

    pub fn from_code(code: &str) -> Option<Self> {
        match code {
            "FT" => Some(EmploymentType::FullTime),
            "PT" => Some(EmploymentType::PartTime),
            "CT" => Some(EmploymentType::Contract),
            "FL" => Some(EmploymentType::Freelance),
            _ => None,
        }
    }

    pub fn display_name(&self) -> &'static str {
        match self {
            EmploymentType::FullTime => "Full-time",
            EmploymentType::PartTime => "Part-time",
            EmploymentType::Contract => "Contract",
            EmploymentType::Freelance => "Freelance",
        }
    }
}

/// Company headcount bucket.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum CompanySize {
    #[serde(rename = "S")]
    Small,
    #[serde(rename = "M")]
    Medium,
    #[serde(rename = "L")]
    Large,
}

impl CompanySize {
    pub fn code(&self) -> &'static str {
        match self {
            CompanySize::Small => "S",
            CompanySize::Medium => "M",
            CompanySize::Large => "L",
        }
    }

    pub fn from_code(code: &str) -> Option<Self> {
        match code {
            "S" => Some(CompanySize::Small),
            "M" => Some(CompanySize::Medium),
            "L" => Some(CompanySize::Large),
            _ => None,
        }
    }

    pub fn display_name(&self) -> &'static str {
        match self {
            CompanySize::Small => "Small",
            CompanySize::Medium => "Medium",
            CompanySize::Large => "Large",
        }
    }
}

/// One row of the salary dataset.
///
/// Field names match the CSV header so the same struct drives loading and
/// the delimited-text export.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Record {
    /// Year the salary was paid.
    pub work_year: i32,
    /// Experience level during the year.
    pub experience_level: ExperienceLevel,
    /// Employment arrangement, when the dataset carries it.
    #[serde(default)]
    pub employment_type: Option<EmploymentType>,
    /// Role title.
    pub job_title: String,
    /// Gross salary converted to USD.
    pub salary_in_usd: f64,
    /// Country code of the employee's residence.
    pub employee_residence: String,
    /// Share of work done remotely (0, 50 or 100 in the public dataset).
    pub remote_ratio: u8,
    /// Country code of the employer's main office.
    pub company_location: String,
    /// Company headcount bucket, when present.
    #[serde(default)]
    pub company_size: Option<CompanySize>,
    /// Employer name, when present.
    #[serde(default)]
    pub company_name: Option<String>,
}

/// Addressable record attributes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Field {
    JobTitle,
    CompanyLocation,
    EmployeeResidence,
    ExperienceLevel,
    EmploymentType,
    CompanySize,
    CompanyName,
    WorkYear,
    RemoteRatio,
    SalaryInUsd,
}

impl Field {
    /// Every field, in CSV column order.
    pub const ALL: [Field; 10] = [
        Field::WorkYear,
        Field::ExperienceLevel,
        Field::EmploymentType,
        Field::JobTitle,
        Field::SalaryInUsd,
        Field::EmployeeResidence,
        Field::RemoteRatio,
        Field::CompanyLocation,
        Field::CompanySize,
        Field::CompanyName,
    ];

    /// Columns a dataset must carry to be loadable.
    pub const REQUIRED: [Field; 7] = [
        Field::JobTitle,
        Field::CompanyLocation,
        Field::EmployeeResidence,
        Field::ExperienceLevel,
        Field::WorkYear,
        Field::SalaryInUsd,
        Field::RemoteRatio,
    ];

    /// Column name in the dataset.
    pub fn as_str(&self) -> &'static str {
        match self {
            Field::JobTitle => "job_title",
            Field::CompanyLocation => "company_location",
            Field::EmployeeResidence => "employee_residence",
            Field::ExperienceLevel => "experience_level",
            Field::EmploymentType => "employment_type",
            Field::CompanySize => "company_size",
            Field::CompanyName => "company_name",
            Field::WorkYear => "work_year",
            Field::RemoteRatio => "remote_ratio",
            Field::SalaryInUsd => "salary_in_usd",
        }
    }

    /// Whether the field accepts range filters.
    pub fn is_numeric(&self) -> bool {
        matches!(
            self,
            Field::WorkYear | Field::RemoteRatio | Field::SalaryInUsd
        )
    }

    /// Whether the field can partition records into groups.
    ///
    /// Salary is the aggregated value and is never a group key.
    pub fn is_groupable(&self) -> bool {
        !matches!(self, Field::SalaryInUsd)
    }

    /// Whether values of this field are country codes.
    pub fn is_country(&self) -> bool {
        matches!(self, Field::CompanyLocation | Field::EmployeeResidence)
    }
}

impl fmt::Display for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for Field {
    type Err = ConfigurationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_lowercase().replace(['-', ' '], "_");
        match normalized.as_str() {
            "job_title" | "job" => Ok(Field::JobTitle),
            "company_location" | "location" => Ok(Field::CompanyLocation),
            "employee_residence" | "residence" => Ok(Field::EmployeeResidence),
            "experience_level" | "experience" => Ok(Field::ExperienceLevel),
            "employment_type" => Ok(Field::EmploymentType),
            "company_size" => Ok(Field::CompanySize),
            "company_name" | "company" => Ok(Field::CompanyName),
            "work_year" | "year" => Ok(Field::WorkYear),
            "remote_ratio" | "remote" => Ok(Field::RemoteRatio),
            "salary_in_usd" | "salary" => Ok(Field::SalaryInUsd),
            _ => Err(ConfigurationError::UnknownField(s.to_string())),
        }
    }
}

/// Borrowed view of one field of one record.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum FieldValue<'a> {
    Text(&'a str),
    Int(i64),
    Number(f64),
}

impl FieldValue<'_> {
    /// Numeric value for range comparisons.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            FieldValue::Text(_) => None,
            FieldValue::Int(v) => Some(*v as f64),
            FieldValue::Number(v) => Some(*v),
        }
    }

    /// Whether the value's canonical text form equals `candidate`.
    pub fn matches_text(&self, candidate: &str) -> bool {
        match self {
            FieldValue::Text(s) => *s == candidate,
            FieldValue::Int(v) => candidate.trim().parse::<i64>().ok() == Some(*v),
            FieldValue::Number(v) => candidate.trim().parse::<f64>().ok() == Some(*v),
        }
    }

    /// Owned group key. Salaries are not groupable, so `Number` has none.
    pub fn to_key(&self) -> Option<GroupKey> {
        match self {
            FieldValue::Text(s) => Some(GroupKey::Text((*s).to_string())),
            FieldValue::Int(v) => Some(GroupKey::Int(*v)),
            FieldValue::Number(_) => None,
        }
    }
}

/// Value of a groupable field, used as an aggregate key.
///
/// Integer keys order numerically so years and remote ratios sort the way
/// a reader expects.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum GroupKey {
    Int(i64),
    Text(String),
}

impl fmt::Display for GroupKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GroupKey::Int(v) => write!(f, "{}", v),
            GroupKey::Text(s) => write!(f, "{}", s),
        }
    }
}

impl From<&str> for GroupKey {
    fn from(s: &str) -> Self {
        GroupKey::Text(s.to_string())
    }
}

impl From<i64> for GroupKey {
    fn from(v: i64) -> Self {
        GroupKey::Int(v)
    }
}

impl Record {
    /// Value of `field`, or `None` when the optional column is absent.
    pub fn value(&self, field: Field) -> Option<FieldValue<'_>> {
        match field {
            Field::JobTitle => Some(FieldValue::Text(&self.job_title)),
            Field::CompanyLocation => Some(FieldValue::Text(&self.company_location)),
            Field::EmployeeResidence => Some(FieldValue::Text(&self.employee_residence)),
            Field::ExperienceLevel => Some(FieldValue::Text(self.experience_level.code())),
            Field::EmploymentType => self.employment_type.map(|t| FieldValue::Text(t.code())),
            Field::CompanySize => self.company_size.map(|s| FieldValue::Text(s.code())),
            Field::CompanyName => self.company_name.as_deref().map(FieldValue::Text),
            Field::WorkYear => Some(FieldValue::Int(i64::from(self.work_year))),
            Field::RemoteRatio => Some(FieldValue::Int(i64::from(self.remote_ratio))),
            Field::SalaryInUsd => Some(FieldValue::Number(self.salary_in_usd)),
        }
    }

    /// Group key for `field`, if the record has one.
    pub fn group_key(&self, field: Field) -> Option<GroupKey> {
        self.value(field).and_then(|v| v.to_key())
    }
}
