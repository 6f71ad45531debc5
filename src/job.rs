//! Batch conversion of one dump into one output file.

use std::fs::File;
use std::io::{BufReader, BufWriter, Error, ErrorKind, Write};
use std::path::{Path, PathBuf};

use log::{debug, error, info};
use serde::{Deserialize, Serialize};

use crate::anomaly::DecodeReport;
use crate::format::FormatVariant;
use crate::io::*;

/// Used when neither the job nor the source file provide a library name.
const DEFAULT_LIBRARY_NAME: &str = "Recovered Presets";

#[derive(Clone, Copy, Debug, Deserialize, Eq, PartialEq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum OutputKind {
    SysEx,
    Json,
    Table,
    StateList,
}

impl OutputKind {
    /// Determine the kind from the file extension.
    pub fn from_path<P: AsRef<Path>>(path: P) -> Option<Self> {
        let extension = path.as_ref().extension()?.to_string_lossy().to_lowercase();
        match extension.as_str() {
            "syx" => Some(OutputKind::SysEx),
            "json" => Some(OutputKind::Json),
            "h" | "hpp" => Some(OutputKind::Table),
            "txt" => Some(OutputKind::StateList),
            _ => None,
        }
    }
}

/// Everything needed to convert one dump.
#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub struct ConversionJob {
    /// The dump holding the patch data.
    pub source: PathBuf,

    /// An annotated listing with the names of the patches in `source`.
    #[serde(default)]
    pub names_source: Option<PathBuf>,

    pub output: PathBuf,

    /// How to decode `source`. Detected from the data when not set.
    #[serde(default)]
    pub format: Option<FormatVariant>,

    /// Detected from the extension of `output` when not set.
    #[serde(default)]
    pub output_kind: Option<OutputKind>,

    #[serde(default)]
    pub library_name: Option<String>,

    #[serde(default)]
    pub sysex_channel: u8,
}

/// What a job produced.
#[derive(Clone, Debug, PartialEq)]
pub struct JobSummary {
    pub variant: FormatVariant,
    pub output_kind: OutputKind,
    pub record_count: usize,
    pub report: DecodeReport,
}

impl ConversionJob {
    pub fn new<P: Into<PathBuf>, Q: Into<PathBuf>>(source: P, output: Q) -> Self {
        Self {
            source: source.into(),
            names_source: None,
            output: output.into(),
            format: None,
            output_kind: None,
            library_name: None,
            sysex_channel: 0,
        }
    }

    /// Read a list of jobs from a JSON file.
    pub fn read_jobs<P: AsRef<Path>>(path: P) -> Result<Vec<ConversionJob>, Error> {
        let reader = BufReader::new(File::open(path.as_ref())?);
        serde_json::from_reader(reader).map_err(|error| {
            Error::new(
                ErrorKind::InvalidData,
                format!("Job file {}: {error}", path.as_ref().to_string_lossy()),
            )
        })
    }

    pub fn output_kind(&self) -> Result<OutputKind, Error> {
        self.output_kind
            .or_else(|| OutputKind::from_path(&self.output))
            .ok_or_else(|| {
                Error::new(
                    ErrorKind::InvalidInput,
                    format!(
                        "Cannot tell the output format of {}",
                        self.output.to_string_lossy()
                    ),
                )
            })
    }

    /// Decode the source, then replace the names with those from the names
    /// source if there is one.
    pub fn decode(&self) -> Result<(Source, Decoded), Error> {
        let source = Source::read_file(&self.source)?;
        let variant = match self.format {
            Some(variant) => variant,
            None => source.sniff()?.into(),
        };
        let mut decoded = decode(&source, variant)?;

        if let Some(names_path) = &self.names_source {
            let names_source = Source::read_file(names_path)?;
            let mut report = DecodeReport::default();
            let names = recover_listing_names(&names_source, &mut report);
            apply_names(&mut decoded.records, &names);
            decoded.report.extend(report);
        }

        Ok((source, decoded))
    }

    /// Write the records in the given format.
    pub fn write_output<W: Write>(
        &self,
        writer: &mut W,
        kind: OutputKind,
        library_name: &str,
        decoded: &Decoded,
    ) -> Result<(), Error> {
        let records = &decoded.records;
        match kind {
            OutputKind::SysEx => write_sysex(writer, records, self.sysex_channel),
            OutputKind::Json => write_json_library(writer, library_name, records),
            OutputKind::Table => write_table(writer, records),
            OutputKind::StateList => write_state_list(writer, records),
        }
    }

    pub fn run(&self) -> Result<JobSummary, Error> {
        let kind = self.output_kind()?;
        let (source, decoded) = self.decode()?;
        let library_name = self
            .library_name
            .clone()
            .or_else(|| source.name.clone())
            .unwrap_or_else(|| DEFAULT_LIBRARY_NAME.to_owned());

        debug!("Writing {kind:?} to {}", self.output.to_string_lossy());
        let mut writer = BufWriter::new(File::create(&self.output)?);
        self.write_output(&mut writer, kind, &library_name, &decoded)?;
        writer.flush()?;

        info!(
            "{}: {} patches ({})",
            self.source.to_string_lossy(),
            decoded.records.len(),
            decoded.report
        );
        Ok(JobSummary {
            variant: decoded.variant,
            output_kind: kind,
            record_count: decoded.records.len(),
            report: decoded.report,
        })
    }
}

/// Run every job. A job that fails is logged and does not stop the others.
pub fn run_all(jobs: &[ConversionJob]) -> Vec<Result<JobSummary, Error>> {
    jobs.iter()
        .map(|job| {
            let result = job.run();
            if let Err(error) = &result {
                error!("{}: {error}", job.source.to_string_lossy());
            }
            result
        })
        .collect()
}

#[cfg(test)]
mod test {
    use std::fs;

    use crate::format::UnrecognizedFormatError;
    use crate::io::sysex::PATCH_DUMP_LENGTH;
    use crate::tests::test_data_path;
    use crate::PATCH_COUNT;

    use super::*;

    fn temp_output(file_name: &str) -> PathBuf {
        std::env::temp_dir().join(format!("juno106-{}-{file_name}", std::process::id()))
    }

    #[test]
    fn output_kind_from_extension() {
        assert_eq!(OutputKind::from_path("a.syx"), Some(OutputKind::SysEx));
        assert_eq!(OutputKind::from_path("a.JSON"), Some(OutputKind::Json));
        assert_eq!(OutputKind::from_path("Presets.h"), Some(OutputKind::Table));
        assert_eq!(OutputKind::from_path("a.txt"), Some(OutputKind::StateList));
        assert_eq!(OutputKind::from_path("a.bin"), None);
        assert_eq!(OutputKind::from_path("a"), None);
        assert!(ConversionJob::new("in.106", "out.bin").output_kind().is_err());
    }

    #[test]
    fn deserialize() {
        let jobs: Vec<ConversionJob> = serde_json::from_str(
            r#"[
                {"source": "bank.hex", "output": "bank.h",
                 "names_source": "names.txt",
                 "format": {"kind": "raw-hex-dump", "stride": 32}},
                {"source": "factory.106", "output": "factory.out", "output_kind": "sys-ex"}
            ]"#,
        )
        .unwrap();
        assert_eq!(jobs.len(), 2);
        assert_eq!(jobs[0].names_source, Some(PathBuf::from("names.txt")));
        assert!(matches!(jobs[0].format, Some(FormatVariant::RawHexDump(_))));
        assert_eq!(jobs[1].output_kind().unwrap(), OutputKind::SysEx);
        assert_eq!(jobs[1].sysex_channel, 0);
    }

    #[test]
    fn container_to_sysex() {
        let output = temp_output("factory.syx");
        let job = ConversionJob::new(test_data_path(&["container", "factory.106"]), &output);
        let summary = job.run().unwrap();
        assert_eq!(summary.output_kind, OutputKind::SysEx);
        assert_eq!(summary.record_count, 3);

        let bytes = fs::read(&output).unwrap();
        assert_eq!(bytes.len(), 3 * PATCH_DUMP_LENGTH);
        assert_eq!(&bytes[..7], &[0xf0, 0x41, 0x30, 0x00, 0x00, 0x14, 0x31]);
        fs::remove_file(output).unwrap();
    }

    #[test]
    fn hex_dump_with_names_to_table() {
        let output = temp_output("bank.h");
        let mut job = ConversionJob::new(test_data_path(&["hex", "bank.hex"]), &output);
        job.names_source = Some(test_data_path(&["listing", "names.txt"]));
        let summary = job.run().unwrap();
        assert_eq!(summary.record_count, PATCH_COUNT);

        let text = fs::read_to_string(&output).unwrap();
        assert!(text.contains("{\"A11 Brass 1\", {0x14,0x7F,"));
        assert!(text.contains("{\"A12 Strings\", {"));
        assert!(text.contains("{\"B88 Unknown\", {0x00,"));
        fs::remove_file(output).unwrap();
    }

    #[test]
    fn json_library_name_from_source() {
        let output = temp_output("factory.json");
        let job = ConversionJob::new(test_data_path(&["container", "factory.106"]), &output);
        job.run().unwrap();
        let text = fs::read_to_string(&output).unwrap();
        assert!(text.contains("\"libraryName\": \"factory\""));
        fs::remove_file(output).unwrap();
    }

    #[test]
    fn batch_continues_after_failure() {
        let output = temp_output("listing.txt");
        let jobs = vec![
            ConversionJob::new(test_data_path(&["listing", "notes.txt"]), temp_output("x.syx")),
            ConversionJob::new(test_data_path(&["listing", "names.txt"]), &output),
        ];
        let results = run_all(&jobs);
        assert_eq!(results.len(), 2);
        let error = results[0].as_ref().unwrap_err();
        assert!(UnrecognizedFormatError::is(error));
        let summary = results[1].as_ref().unwrap();
        assert_eq!(summary.variant, FormatVariant::AnnotatedListing);
        assert_eq!(summary.record_count, PATCH_COUNT);
        fs::remove_file(output).unwrap();
    }
}
