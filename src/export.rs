use chrono::{DateTime, Local};
use log::info;
use serde::Serialize;
use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use crate::error::Result;
use crate::profile::Profile;

/// One flattened CSV line. Field order is the column order.
#[derive(Debug, Serialize)]
struct CsvRow<'a> {
    #[serde(rename = "Name")]
    name: &'a str,
    #[serde(rename = "Profile Link")]
    profile_link: &'a str,
    #[serde(rename = "Location")]
    location: &'a str,
    #[serde(rename = "Total Experience")]
    total_experience: String,
    #[serde(rename = "Competency")]
    competency: &'a str,
    #[serde(rename = "Title")]
    title: &'a str,
    #[serde(rename = "Education")]
    education: String,
    #[serde(rename = "Experience")]
    experience: String,
}

impl<'a> From<&'a Profile> for CsvRow<'a> {
    fn from(profile: &'a Profile) -> Self {
        CsvRow {
            name: &profile.name,
            profile_link: &profile.profile_link,
            location: &profile.location,
            total_experience: profile.total_experience.to_string(),
            competency: &profile.competency,
            title: &profile.title,
            education: profile
                .education
                .iter()
                .map(|e| e.summary())
                .collect::<Vec<_>>()
                .join("; "),
            experience: profile
                .experience
                .iter()
                .map(|e| e.summary())
                .collect::<Vec<_>>()
                .join("; "),
        }
    }
}

/// "{company}_{query}_{timestamp}", safe to use as a file name.
pub fn export_stem(company: &str, query: &str, at: DateTime<Local>) -> String {
    let raw = format!("{}_{}_{}", company.trim(), query.trim(), at.format("%Y-%m-%d_%H-%M-%S"));
    raw.chars()
        .map(|c| match c {
            '/' | '\\' | ':' | '*' | '?' | '"' | '<' | '>' | '|' => '_',
            c if c.is_control() => '_',
            c => c,
        })
        .collect()
}

pub fn write_json(batch: &[Profile], path: &Path) -> Result<()> {
    let mut writer = BufWriter::new(File::create(path)?);
    let formatter = serde_json::ser::PrettyFormatter::with_indent(b"    ");
    let mut ser = serde_json::Serializer::with_formatter(&mut writer, formatter);
    batch.serialize(&mut ser)?;
    writer.flush()?;
    Ok(())
}

pub fn write_csv(batch: &[Profile], path: &Path) -> Result<()> {
    let mut writer = csv::Writer::from_path(path)?;
    for profile in batch {
        writer.serialize(CsvRow::from(profile))?;
    }
    writer.flush()?;
    Ok(())
}

/// Writes the batch as `<stem>.json` and `<stem>.csv` under `dir`.
pub fn write_batch(batch: &[Profile], dir: &Path, stem: &str) -> Result<(PathBuf, PathBuf)> {
    if !dir.as_os_str().is_empty() {
        fs::create_dir_all(dir)?;
    }
    let json_path = dir.join(format!("{}.json", stem));
    let csv_path = dir.join(format!("{}.csv", stem));

    write_json(batch, &json_path)?;
    info!("JSON file is saved with name {}", json_path.display());
    write_csv(batch, &csv_path)?;
    info!("CSV file is saved with name {}", csv_path.display());

    Ok((json_path, csv_path))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::duration::DurationSpan;
    use crate::profile::{EducationEntry, ExperienceEntry};
    use chrono::TimeZone;

    fn full_profile() -> Profile {
        let mut profile = Profile {
            profile_link: "https://www.linkedin.com/in/ada".into(),
            title: "Analyst".into(),
            name: "Ada Lovelace".into(),
            location: "London".into(),
            total_experience: DurationSpan { years: 1, months: 4 },
            competency: "Math, Ada".into(),
            education: vec![
                EducationEntry { institute: "University of London".into(), qualification: "BSc".into() },
                EducationEntry { institute: "Home tutoring".into(), qualification: "".into() },
            ],
            experience: vec![ExperienceEntry {
                role: "Analyst".into(),
                company: "Babbage & Co".into(),
                period: "1 yr 4 mos".into(),
                skills: vec!["Mathematics".into()],
            }],
            ..Default::default()
        };
        profile.contact_info.insert("Email".into(), "ada@example.com".into());
        profile
    }

    fn sparse_profile() -> Profile {
        Profile {
            profile_link: "https://www.linkedin.com/in/grace".into(),
            name: "Grace Hopper".into(),
            ..Default::default()
        }
    }

    #[test]
    fn test_csv_single_row_joins_education() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("one.csv");
        write_csv(&[full_profile()], &path).unwrap();

        let mut reader = csv::Reader::from_path(&path).unwrap();
        let headers = reader.headers().unwrap().clone();
        assert_eq!(
            headers.iter().collect::<Vec<_>>(),
            vec!["Name", "Profile Link", "Location", "Total Experience", "Competency", "Title", "Education", "Experience"]
        );
        let rows: Vec<csv::StringRecord> = reader.records().map(|r| r.unwrap()).collect();
        assert_eq!(rows.len(), 1);
        assert_eq!(&rows[0][6], "University of London: BSc; Home tutoring: ");
        assert_eq!(&rows[0][7], "Analyst at Babbage & Co (1 yr 4 mos)");
        assert_eq!(&rows[0][3], "1 yrs 4 mos");
    }

    #[test]
    fn test_batch_of_two_writes_both_files() {
        let dir = tempfile::tempdir().unwrap();
        let batch = vec![full_profile(), sparse_profile()];
        let (json_path, csv_path) = write_batch(&batch, dir.path(), "Acme_rust_now").unwrap();

        let json: serde_json::Value = serde_json::from_str(&fs::read_to_string(&json_path).unwrap()).unwrap();
        let items = json.as_array().unwrap();
        assert_eq!(items.len(), 2);
        assert_eq!(items[1]["Title"], "");
        assert_eq!(items[1]["Location"], "");
        assert_eq!(items[1]["Competancy"], "");
        assert_eq!(items[0]["Contact_info"]["Email"], "ada@example.com");
        assert_eq!(items[0]["Experience"][0]["skill"][0], "Mathematics");

        let mut reader = csv::Reader::from_path(&csv_path).unwrap();
        let rows: Vec<csv::StringRecord> = reader.records().map(|r| r.unwrap()).collect();
        assert_eq!(rows.len(), 2);
        assert_eq!(&rows[1][2], "");
        assert_eq!(&rows[1][5], "");
        assert_eq!(&rows[1][3], "0 yrs 0 mos");
    }

    #[test]
    fn test_json_uses_four_space_indent() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("p.json");
        write_json(&[sparse_profile()], &path).unwrap();
        let text = fs::read_to_string(&path).unwrap();
        assert!(text.contains("\n        \"Profile Link\""));
    }

    #[test]
    fn test_export_stem_is_file_safe() {
        let at = Local.with_ymd_and_hms(2024, 5, 1, 13, 4, 5).unwrap();
        assert_eq!(export_stem("Acme/Inc", "rust: senior", at), "Acme_Inc_rust_ senior_2024-05-01_13-04-05");
    }
}
