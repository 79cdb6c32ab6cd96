use crate::simulate::{Gender, PatientRecord, RiskLevel};

use flate2::read::GzDecoder;
use std::fs::File;
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::path::Path;

const HEADER: [&str; 9] = [
    "Patient_ID",
    "Age",
    "Gender",
    "Genetic_Variant",
    "Disease_Risk",
    "Disease",
    "Risk_Score",
    "Lab_Result_1",
    "Lab_Result_2",
];

const DESCRIPTIONS: [&str; 9] = [
    "Unique patient identifier",
    "Age of the patient",
    "Gender of the patient",
    "Genetic variant present",
    "Disease risk level",
    "Disease assigned",
    "Risk score calculated",
    "Simulated lab result 1",
    "Simulated lab result 2",
];

///
/// Open a file for reading, and return a buffered reader
/// * `input_file` - file name--either gzipped or not
pub fn open_buf_reader(input_file: &str) -> anyhow::Result<Box<dyn BufRead>> {
    let ext = Path::new(input_file).extension().and_then(|x| x.to_str());
    match ext {
        Some("gz") => {
            let input_file = File::open(input_file)?;
            let decoder = GzDecoder::new(input_file);
            Ok(Box::new(BufReader::new(decoder)))
        }
        _ => {
            let input_file = File::open(input_file)?;
            Ok(Box::new(BufReader::new(input_file)))
        }
    }
}

///
/// Open a file for writing, and return a buffered writer
/// * `output_file` - file name--either gzipped or not
pub fn open_buf_writer(output_file: &str) -> anyhow::Result<Box<dyn Write>> {
    let ext = Path::new(output_file).extension().and_then(|x| x.to_str());
    match ext {
        Some("gz") => {
            let output_file = File::create(output_file)?;
            let encoder =
                flate2::write::GzEncoder::new(output_file, flate2::Compression::default());
            Ok(Box::new(BufWriter::new(encoder)))
        }
        _ => {
            let output_file = File::create(output_file)?;
            Ok(Box::new(BufWriter::new(output_file)))
        }
    }
}

///
/// Create a directory if needed
/// * `file` - file name
///
pub fn mkdir(file: &str) -> anyhow::Result<()> {
    let path = Path::new(file);
    let dir = path.parent().ok_or(anyhow::anyhow!("no parent"))?;
    std::fs::create_dir_all(dir)?;
    Ok(())
}

///
/// Write records as tab-separated values with a header row
/// * `output_file` - file name--either gzipped or not
///
pub fn write_records_tsv(records: &[PatientRecord], output_file: &str) -> anyhow::Result<()> {
    let mut buf = open_buf_writer(output_file)?;

    writeln!(buf, "{}", HEADER.join("\t"))?;
    for r in records {
        writeln!(
            buf,
            "{}\t{}\t{}\t{}\t{}\t{}\t{}\t{}\t{}",
            r.patient_id,
            r.age,
            r.gender.as_str(),
            r.genetic_variant,
            r.disease_risk.as_str(),
            r.disease,
            r.risk_score,
            r.lab_result_1,
            r.lab_result_2
        )?;
    }
    buf.flush()?;
    Ok(())
}

/// Write the column descriptions as a sidecar data dictionary
pub fn write_data_dictionary(output_file: &str) -> anyhow::Result<()> {
    let mut buf = open_buf_writer(output_file)?;
    writeln!(buf, "Column\tDescription")?;
    for (column, description) in HEADER.iter().zip(DESCRIPTIONS.iter()) {
        writeln!(buf, "{}\t{}", column, description)?;
    }
    buf.flush()?;
    Ok(())
}

///
/// Read records back from a tab-separated file written by
/// `write_records_tsv`
///
pub fn read_records_tsv(input_file: &str) -> anyhow::Result<Vec<PatientRecord>> {
    let buf = open_buf_reader(input_file)?;
    let mut lines = buf.lines();

    let header = lines
        .next()
        .ok_or_else(|| anyhow::anyhow!("empty records file: {}", input_file))??;
    if header.split('\t').count() != HEADER.len() {
        return Err(anyhow::anyhow!(
            "unexpected header in {}: {}",
            input_file,
            header
        ));
    }

    let mut records = vec![];
    for line in lines {
        let line = line?;
        if line.is_empty() {
            continue;
        }
        let words: Vec<&str> = line.split('\t').collect();
        if words.len() != HEADER.len() {
            return Err(anyhow::anyhow!(
                "expected {} fields, found {}: {}",
                HEADER.len(),
                words.len(),
                line
            ));
        }

        records.push(PatientRecord {
            patient_id: words[0].parse()?,
            age: words[1].parse()?,
            gender: Gender::parse(words[2])?,
            genetic_variant: words[3].into(),
            disease_risk: RiskLevel::parse(words[4])?,
            disease: words[5].into(),
            risk_score: words[6].parse()?,
            lab_result_1: words[7].parse()?,
            lab_result_2: words[8].parse()?,
        });
    }

    Ok(records)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::simulate::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn records_round_trip_through_tsv_gz() -> anyhow::Result<()> {
        let mut rng = StdRng::seed_from_u64(3);
        let graph = KnowledgeGraph::build(
            &boxed_names(&DEFAULT_DISEASES),
            &boxed_names(&DEFAULT_VARIANTS),
            &mut rng,
        )?;
        let records = simulate_records(25, &graph, &mut rng)?;

        let dir = tempfile::tempdir()?;
        let file = dir
            .path()
            .join("records.tsv.gz")
            .to_string_lossy()
            .to_string();

        write_records_tsv(&records, &file)?;
        let recovered = read_records_tsv(&file)?;

        assert_eq!(recovered.len(), records.len());
        for (a, b) in records.iter().zip(recovered.iter()) {
            assert_eq!(a.patient_id, b.patient_id);
            assert_eq!(a.age, b.age);
            assert_eq!(a.gender, b.gender);
            assert_eq!(a.genetic_variant, b.genetic_variant);
            assert_eq!(a.disease_risk, b.disease_risk);
            assert_eq!(a.disease, b.disease);
        }
        Ok(())
    }
}
