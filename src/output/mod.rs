// mod.rs - Output formatters module

use crate::data::{AlleleObservation, GenotypeCluster, Variant};
use std::fs::{create_dir_all, File};
use std::io::{BufWriter, Write};
use std::path::Path;

/// Ensure parent directory exists before creating file
fn ensure_parent_dir(file_path: &str) -> Result<(), String> {
    if let Some(parent) = Path::new(file_path).parent() {
        create_dir_all(parent)
            .map_err(|e| format!("Failed to create parent directory '{}': {}", parent.display(), e))?;
    }
    Ok(())
}

fn create_writer(file_path: &str) -> Result<BufWriter<File>, String> {
    ensure_parent_dir(file_path)?;
    let file = File::create(file_path).map_err(|e| format!("Failed to create output file '{}': {}", file_path, e))?;
    Ok(BufWriter::new(file))
}

fn write_err(e: std::io::Error) -> String {
    format!("Write error: {}", e)
}

/// Variants ordered by (chrom, start, end)
fn sorted_variants(variants: &[Variant]) -> Vec<&Variant> {
    let mut sorted: Vec<&Variant> = variants.iter().collect();
    sorted.sort_by(|a, b| a.locus.key().cmp(&b.locus.key()));
    sorted
}

/// 1-based index of the genotype cluster whose interval holds the allele
fn allele_cluster(allele: &AlleleObservation, genotype: &[GenotypeCluster], in_size: bool) -> String {
    let value = if in_size { allele.size as f64 } else { allele.copy_number };
    genotype
        .iter()
        .position(|c| value >= c.ci.0 && value <= c.ci.1)
        .map(|i| (i + 1).to_string())
        .unwrap_or_else(|| "NA".to_string())
}

/// Size in bp and copy number of a cluster, whichever unit it was called in
fn cluster_size_and_copies(cluster: &GenotypeCluster, motif_len: usize, in_size: bool) -> (f64, f64) {
    let unit = motif_len.max(1) as f64;
    if in_size {
        (cluster.value, (cluster.value / unit * 10.0).round() / 10.0)
    } else {
        (cluster.value * unit, cluster.value)
    }
}

/// Write one row per supporting read, alleles by copy number descending
pub fn write_tsv(file_path: &str, variants: &[Variant], in_size: bool, command_line: &str) -> Result<(), String> {
    let mut writer = create_writer(file_path)?;

    writeln!(
        writer,
        "#{} {}",
        chrono::Utc::now().format("%Y-%m-%d %H:%M:%S UTC"),
        command_line
    )
    .map_err(write_err)?;
    writeln!(
        writer,
        "#chrom\tstart\tend\trepeat_unit\tgenotype\tread\tcopy_number\tsize\tread_start\tstrand\tallele"
    )
    .map_err(write_err)?;

    for variant in sorted_variants(variants) {
        if variant.genotype.is_empty() {
            continue;
        }
        let summary = variant.genotype_summary();
        let mut alleles: Vec<&AlleleObservation> = variant.alleles.iter().collect();
        alleles.sort_by(|a, b| b.copy_number.total_cmp(&a.copy_number));
        for allele in alleles {
            writeln!(
                writer,
                "{}\t{}\t{}\t{}\t{}\t{}\t{:.1}\t{}\t{}\t{}\t{}",
                variant.locus.chrom,
                variant.locus.start,
                variant.locus.end,
                variant.motif,
                summary,
                allele.read,
                allele.copy_number,
                allele.size,
                allele.read_start,
                allele.strand,
                allele_cluster(allele, &variant.genotype, in_size)
            )
            .map_err(write_err)?;
        }
    }

    writer.flush().map_err(|e| format!("Flush error: {}", e))?;
    println!("✅ Alleles written to: {}", file_path);
    Ok(())
}

/// Write one row per locus with size, copy number and support per cluster
pub fn write_bed(file_path: &str, variants: &[Variant], max_num_clusters: usize, in_size: bool) -> Result<(), String> {
    let mut writer = create_writer(file_path)?;

    let mut headers = vec!["chrom".to_string(), "start".into(), "end".into(), "repeat_unit".into()];
    for i in 1..=max_num_clusters {
        for field in ["size", "copy_number", "support"] {
            headers.push(format!("allele{}:{}", i, field));
        }
    }
    writeln!(writer, "#{}", headers.join("\t")).map_err(write_err)?;

    for variant in sorted_variants(variants) {
        let mut cols = vec![
            variant.locus.chrom.clone(),
            variant.locus.start.to_string(),
            variant.locus.end.to_string(),
            variant.motif.clone(),
        ];
        for cluster in variant.genotype.iter().take(max_num_clusters) {
            let (size, copies) = cluster_size_and_copies(cluster, variant.motif.len(), in_size);
            cols.push(format!("{:.1}", size));
            cols.push(format!("{:.1}", copies));
            cols.push(cluster.support.to_string());
        }
        for _ in variant.genotype.len()..max_num_clusters {
            cols.extend(["-".to_string(), "-".to_string(), "-".to_string()]);
        }
        writeln!(writer, "{}", cols.join("\t")).map_err(write_err)?;
    }

    writer.flush().map_err(|e| format!("Flush error: {}", e))?;
    println!("✅ Loci written to: {}", file_path);
    Ok(())
}

const VCF_HEADER: &[&str] = &[
    "##fileformat=VCFv4.1",
    "##INFO=<ID=END,Number=1,Type=Integer,Description=\"End position of the variant\">",
    "##INFO=<ID=REF,Number=1,Type=Integer,Description=\"Reference copy number\">",
    "##INFO=<ID=REPID,Number=1,Type=String,Description=\"Repeat identifier as specified in the variant catalog\">",
    "##INFO=<ID=VARID,Number=1,Type=String,Description=\"Variant identifier as specified in the variant catalog\">",
    "##INFO=<ID=RL,Number=1,Type=Integer,Description=\"Reference length in bp\">",
    "##INFO=<ID=RU,Number=1,Type=String,Description=\"Repeat unit in the reference orientation\">",
    "##INFO=<ID=SVTYPE,Number=1,Type=String,Description=\"Type of structural variant\">",
    "##FILTER=<ID=PASS,Description=\"All filters passed\">",
    "##FORMAT=<ID=GT,Number=1,Type=String,Description=\"Genotype\">",
    "##FORMAT=<ID=SO,Number=1,Type=String,Description=\"Type of reads that support the allele\">",
    "##FORMAT=<ID=CN,Number=1,Type=String,Description=\"Number of repeat units spanned by the allele\">",
    "##FORMAT=<ID=CI,Number=1,Type=String,Description=\"Confidence interval for CN\">",
    "##FORMAT=<ID=AD_SP,Number=1,Type=String,Description=\"Number of spanning reads consistent with the allele\">",
];

/// Render one VCF record, or `None` for homozygous reference calls
pub fn vcf_record(variant: &Variant, in_size: bool) -> Option<String> {
    let locus = &variant.locus;
    let unit = variant.motif.len().max(1);
    let ref_len = locus.span();
    let ref_copies = ref_len / unit as i64;
    let ref_base = variant.motif.chars().next().unwrap_or('N');
    let repeat_id = locus.label.as_deref().unwrap_or(".");
    let variant_id = locus.variant_id.as_deref().unwrap_or(".");

    let calls: Vec<(i64, (i64, i64), usize)> = variant
        .genotype
        .iter()
        .take(2)
        .map(|c| {
            let (_, copies) = cluster_size_and_copies(c, unit, in_size);
            let scale = if in_size { unit as f64 } else { 1.0 };
            let ci = ((c.ci.0 / scale).round() as i64, (c.ci.1 / scale).round() as i64);
            (copies.round() as i64, ci, c.support)
        })
        .collect();

    let info = format!(
        "SVTYPE=STR;END={};REF={};RL={};RU={};REPID={};VARID={}",
        locus.end, ref_copies, ref_len, variant.motif, repeat_id, variant_id
    );
    let format = "GT:SO:CN:CI:AD_SP";
    match calls.as_slice() {
        [(cn, ci, support)] => {
            if (cn - ref_copies).abs() < 1 {
                return None;
            }
            Some(format!(
                "{}\t{}\t.\t{}\t<STR{}>\t.\tPASS\t{}\t{}\t1/1:SPANNING/SPANNING:{}/{}:{}-{}/{}-{}:{}/{}",
                locus.chrom, locus.start, ref_base, cn, info, format, cn, cn, ci.0, ci.1, ci.0, ci.1,
                support / 2, support - support / 2
            ))
        }
        [(cn1, ci1, s1), (cn2, ci2, s2)] => Some(format!(
            "{}\t{}\t.\t{}\t<STR{}>,<STR{}>\t.\tPASS\t{}\t{}\t1/2:SPANNING/SPANNING:{}/{}:{}-{}/{}-{}:{}/{}",
            locus.chrom, locus.start, ref_base, cn1, cn2, info, format, cn1, cn2, ci1.0, ci1.1, ci2.0, ci2.1, s1, s2
        )),
        _ => None,
    }
}

/// Write genotyped loci as minimal STR records
pub fn write_vcf(file_path: &str, variants: &[Variant], sample: &str, in_size: bool) -> Result<(), String> {
    let mut writer = create_writer(file_path)?;
    for line in VCF_HEADER {
        writeln!(writer, "{}", line).map_err(write_err)?;
    }
    writeln!(writer, "#CHROM\tPOS\tID\tREF\tALT\tQUAL\tFILTER\tINFO\tFORMAT\t{}", sample).map_err(write_err)?;

    for variant in sorted_variants(variants) {
        if let Some(record) = vcf_record(variant, in_size) {
            writeln!(writer, "{}", record).map_err(write_err)?;
        }
    }

    writer.flush().map_err(|e| format!("Flush error: {}", e))?;
    println!("✅ VCF written to: {}", file_path);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::{Locus, LocusOrigin, Strand};
    use std::fs;
    use tempfile::tempdir;

    fn allele(read: &str, copies: f64) -> AlleleObservation {
        AlleleObservation {
            read: read.to_string(),
            read_start: 10,
            motifs: ["CAG".to_string()].into_iter().collect(),
            size: (copies * 3.0) as i64,
            genome_start: 1000,
            genome_end: 1030,
            strand: Strand::Forward,
            copy_number: copies,
        }
    }

    fn variant(chrom: &str, start: i64, genotype: Vec<GenotypeCluster>) -> Variant {
        let mut locus = Locus::new(chrom, start, start + 30, "CAG", LocusOrigin::UserSupplied);
        locus.label = Some("HTT".to_string());
        Variant {
            locus,
            alleles: vec![allele("r1", 10.0), allele("r2", 40.0), allele("r3", 10.0)],
            motif: "CAG".to_string(),
            genotype,
        }
    }

    fn cluster(value: f64, support: usize, ci: (f64, f64)) -> GenotypeCluster {
        GenotypeCluster { value, support, ci }
    }

    #[test]
    fn test_write_tsv_sorted_rows() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("out/calls.tsv");
        let path = path.to_str().unwrap();
        let variants = vec![
            variant("chr2", 500, vec![cluster(10.0, 2, (10.0, 10.0))]),
            variant("chr1", 900, vec![cluster(10.0, 2, (10.0, 10.0)), cluster(40.0, 1, (40.0, 40.0))]),
            variant("chr1", 100, Vec::new()),
        ];
        write_tsv(path, &variants, false, "trecall test").unwrap();

        let text = fs::read_to_string(path).unwrap();
        let rows: Vec<&str> = text.lines().filter(|l| !l.starts_with('#')).collect();
        assert_eq!(rows.len(), 6);
        assert!(rows[0].starts_with("chr1\t900\t930\tCAG\t10.0(2);40.0(1)\tr2\t40.0\t120"));
        assert!(rows[0].ends_with("\t2"));
        assert!(rows[1].ends_with("\t1"));
        assert!(rows[5].starts_with("chr2\t500"));
    }

    #[test]
    fn test_write_bed_pads_clusters() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("calls.bed");
        let path = path.to_str().unwrap();
        write_bed(path, &[variant("chr1", 900, vec![cluster(10.0, 2, (10.0, 10.0))])], 3, false).unwrap();

        let text = fs::read_to_string(path).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert!(lines[0].starts_with("#chrom\tstart\tend\trepeat_unit\tallele1:size"));
        assert_eq!(lines[1], "chr1\t900\t930\tCAG\t30.0\t10.0\t2\t-\t-\t-\t-\t-\t-");
    }

    #[test]
    fn test_vcf_records() {
        // reference is 10 copies
        let het = variant("chr1", 900, vec![cluster(10.0, 2, (9.8, 10.2)), cluster(40.0, 3, (38.0, 41.0))]);
        let record = vcf_record(&het, false).unwrap();
        assert!(record.starts_with("chr1\t900\t.\tC\t<STR10>,<STR40>"));
        assert!(record.contains("REF=10;RL=30;RU=CAG;REPID=HTT;VARID=."));
        assert!(record.ends_with("1/2:SPANNING/SPANNING:10/40:10-10/38-41:2/3"));

        let hom_ref = variant("chr1", 900, vec![cluster(10.0, 4, (10.0, 10.0))]);
        assert!(vcf_record(&hom_ref, false).is_none());

        let hom_alt = variant("chr1", 900, vec![cluster(120.0, 4, (117.0, 123.0))]);
        let record = vcf_record(&hom_alt, true).unwrap();
        assert!(record.contains("<STR40>"));
        assert!(record.ends_with("1/1:SPANNING/SPANNING:40/40:39-41/39-41:2/2"));
    }
}
