//! JSON shapes exchanged with the schedule, roster and catalog collaborators.
//!
//! Field names are camelCase, dates `YYYY-MM-DD`. Times are read as `HH:MM`
//! or `HH:MM:SS` and always written as `HH:MM:SS`.

use chrono::{NaiveDate, NaiveTime};
use serde::{Deserialize, Serialize};

use crate::catalog::{CatalogError, ShiftCatalog};
use crate::model::*;
use crate::page::{Page, PageRequest};
use crate::scheduler::ScheduleError;

/// Collaborator routes, relative to the service base URL.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Endpoint<'a> {
    ShiftCatalog,
    Doctors { search: Option<&'a str> },
    ShiftCountOnDate { doctor_id: DoctorId, date: NaiveDate },
    Periods(PageRequest),
    MonthlySummary { year: i32, month: u32 },
    DoctorRange(DateRange),
    CoverageGap(DateRange),
    CreatePeriod,
}

impl Endpoint<'_> {
    pub fn method(&self) -> &'static str {
        match self {
            Endpoint::CreatePeriod => "POST",
            _ => "GET",
        }
    }

    pub fn path(&self) -> String {
        match self {
            Endpoint::ShiftCatalog => "shifts/catalog".into(),
            Endpoint::Doctors { .. } => "doctors".into(),
            Endpoint::ShiftCountOnDate { doctor_id, .. } => {
                format!("schedule/doctor/{doctor_id}/shiftCountOnDate")
            }
            Endpoint::Periods(_) | Endpoint::CreatePeriod => "schedule/periods".into(),
            Endpoint::MonthlySummary { .. } => "schedule/monthlySummary".into(),
            Endpoint::DoctorRange(_) => "schedule/doctorRange".into(),
            Endpoint::CoverageGap(_) => "schedule/coverageGap".into(),
        }
    }

    /// Unencoded query pairs; the HTTP client does the escaping.
    pub fn query(&self) -> Vec<(&'static str, String)> {
        match self {
            Endpoint::Doctors { search } => search
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(|s| vec![("search", s.to_string())])
                .unwrap_or_default(),
            Endpoint::ShiftCountOnDate { date, .. } => vec![("date", date.to_string())],
            Endpoint::Periods(req) => vec![
                ("page", req.page.to_string()),
                ("pageSize", req.page_size.to_string()),
            ],
            Endpoint::MonthlySummary { year, month } => {
                vec![("year", year.to_string()), ("month", month.to_string())]
            }
            Endpoint::DoctorRange(range) | Endpoint::CoverageGap(range) => {
                vec![("from", range.from.to_string()), ("to", range.to.to_string())]
            }
            Endpoint::ShiftCatalog | Endpoint::CreatePeriod => Vec::new(),
        }
    }
}

mod hms {
    use chrono::NaiveTime;
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(t: &NaiveTime, s: S) -> Result<S::Ok, S::Error> {
        s.collect_str(&t.format("%H:%M:%S"))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<NaiveTime, D::Error> {
        let raw = String::deserialize(d)?;
        NaiveTime::parse_from_str(&raw, "%H:%M:%S")
            .or_else(|_| NaiveTime::parse_from_str(&raw, "%H:%M"))
            .map_err(|_| serde::de::Error::custom(format!("invalid time of day: {raw:?}")))
    }
}

// ── Catalog and roster ───────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ShiftDto {
    pub shift_id: ShiftId,
    pub shift_type: String,
    #[serde(with = "hms")]
    pub start_time: NaiveTime,
    #[serde(with = "hms")]
    pub end_time: NaiveTime,
}

impl From<&Shift> for ShiftDto {
    fn from(s: &Shift) -> Self {
        Self {
            shift_id: s.id,
            shift_type: s.shift_type.clone(),
            start_time: s.start,
            end_time: s.end,
        }
    }
}

impl From<ShiftDto> for Shift {
    fn from(dto: ShiftDto) -> Self {
        Self {
            id: dto.shift_id,
            shift_type: dto.shift_type,
            start: dto.start_time,
            end: dto.end_time,
        }
    }
}

/// Validate a decoded `shifts/catalog` response.
pub fn catalog_from_wire(shifts: Vec<ShiftDto>) -> Result<ShiftCatalog, CatalogError> {
    ShiftCatalog::new(shifts.into_iter().map(Shift::from).collect())
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DoctorDto {
    pub doctor_id: DoctorId,
    pub full_name: String,
    pub specialty: String,
}

impl From<&Doctor> for DoctorDto {
    fn from(d: &Doctor) -> Self {
        Self {
            doctor_id: d.id,
            full_name: d.full_name.clone(),
            specialty: d.specialty.clone(),
        }
    }
}

impl From<DoctorDto> for Doctor {
    fn from(dto: DoctorDto) -> Self {
        Self {
            id: dto.doctor_id,
            full_name: dto.full_name,
            specialty: dto.specialty,
        }
    }
}

// ── Periods ──────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PageDto<T> {
    pub items: Vec<T>,
    pub page: usize,
    pub page_size: usize,
    pub total_items: usize,
}

impl<T> PageDto<T> {
    pub fn from_page<U>(page: &Page<U>, f: impl Fn(&U) -> T) -> Self {
        Self {
            items: page.items.iter().map(f).collect(),
            page: page.page,
            page_size: page.page_size,
            total_items: page.total_items,
        }
    }
}

impl<T> From<PageDto<T>> for Page<T> {
    fn from(dto: PageDto<T>) -> Self {
        Page {
            items: dto.items,
            page: dto.page,
            page_size: dto.page_size,
            total_items: dto.total_items,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PeriodShiftDto {
    pub shift_type: String,
    #[serde(with = "hms")]
    pub start_time: NaiveTime,
    #[serde(with = "hms")]
    pub end_time: NaiveTime,
    pub doctors: Vec<DoctorDto>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PeriodDto {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub period_id: Option<PeriodId>,
    pub effective_from: NaiveDate,
    pub effective_to: NaiveDate,
    pub shifts: Vec<PeriodShiftDto>,
}

impl From<&PeriodSummary> for PeriodDto {
    fn from(p: &PeriodSummary) -> Self {
        Self {
            period_id: Some(p.id),
            effective_from: p.range.from,
            effective_to: p.range.to,
            shifts: p
                .shifts
                .iter()
                .map(|s| PeriodShiftDto {
                    shift_type: s.shift.shift_type.clone(),
                    start_time: s.shift.start,
                    end_time: s.shift.end,
                    doctors: s.doctors.iter().map(DoctorDto::from).collect(),
                })
                .collect(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ShiftAssignmentDto {
    pub shift_id: ShiftId,
    pub doctor_ids: Vec<DoctorId>,
}

/// Body of `POST schedule/periods`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreatePeriodRequest {
    pub effective_from: NaiveDate,
    pub effective_to: NaiveDate,
    pub shifts: Vec<ShiftAssignmentDto>,
}

impl From<&WorkSchedulePeriod> for CreatePeriodRequest {
    fn from(p: &WorkSchedulePeriod) -> Self {
        Self {
            effective_from: p.effective_from(),
            effective_to: p.effective_to(),
            shifts: p
                .assignments()
                .iter()
                .map(|a| ShiftAssignmentDto {
                    shift_id: a.shift_id,
                    doctor_ids: a.doctor_ids.iter().copied().collect(),
                })
                .collect(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreatePeriodResponse {
    pub period_id: PeriodId,
    #[serde(default)]
    pub message: String,
}

// ── Read-side views ──────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DailySummaryDto {
    pub date: NaiveDate,
    pub shift_count: u32,
    pub doctor_count: u32,
}

impl From<&DailyScheduleSummary> for DailySummaryDto {
    fn from(s: &DailyScheduleSummary) -> Self {
        Self {
            date: s.date,
            shift_count: s.shift_count,
            doctor_count: s.doctor_count,
        }
    }
}

impl From<DailySummaryDto> for DailyScheduleSummary {
    fn from(dto: DailySummaryDto) -> Self {
        Self {
            date: dto.date,
            shift_count: dto.shift_count,
            doctor_count: dto.doctor_count,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DoctorRangeEntryDto {
    pub doctor_name: String,
    pub specialty: String,
    pub date: NaiveDate,
    pub shift_type: String,
    #[serde(with = "hms")]
    pub start_time: NaiveTime,
    #[serde(with = "hms")]
    pub end_time: NaiveTime,
    #[serde(default)]
    pub status: ScheduleStatus,
}

impl From<&DoctorScheduleEntry> for DoctorRangeEntryDto {
    fn from(e: &DoctorScheduleEntry) -> Self {
        Self {
            doctor_name: e.doctor.full_name.clone(),
            specialty: e.doctor.specialty.clone(),
            date: e.date,
            shift_type: e.shift.shift_type.clone(),
            start_time: e.shift.start,
            end_time: e.shift.end,
            status: e.status,
        }
    }
}

// ── Errors ───────────────────────────────────────────────

/// Error payload handed back to the UI layer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ErrorBody {
    pub code: String,
    pub message: String,
    pub retryable: bool,
}

impl From<&ScheduleError> for ErrorBody {
    fn from(e: &ScheduleError) -> Self {
        Self {
            code: e.kind().to_string(),
            message: e.to_string(),
            retryable: e.is_retryable(),
        }
    }
}
