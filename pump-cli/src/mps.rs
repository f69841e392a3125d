//! MPS file parser.
//!
//! Covers the fixed/free MPS subset MIP benchmarks use: NAME, OBJSENSE,
//! ROWS, COLUMNS (with INTORG/INTEND integrality markers), RHS, RANGES,
//! BOUNDS and ENDATA. Ranged rows are normalized to the
//! `[rhs - range, rhs]` convention regardless of the row sense they were
//! declared with.

use std::collections::HashMap;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

use anyhow::{anyhow, bail, Context, Result};
use pump_core::model::{ModelBuilder, ModelData, ObjSense, RowSense, VarType};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum RowKind {
    Objective,
    Le,
    Ge,
    Eq,
}

struct RawRow {
    name: String,
    kind: RowKind,
    entries: Vec<(usize, f64)>,
    rhs: f64,
    range: Option<f64>,
}

struct RawCol {
    name: String,
    integer: bool,
    lb: f64,
    ub: f64,
    lb_set: bool,
    ub_set: bool,
    binary: bool,
    obj: f64,
}

/// Parse an MPS file into model data.
pub fn parse_mps<P: AsRef<Path>>(path: P) -> Result<ModelData> {
    let path = path.as_ref();
    let file = File::open(path).with_context(|| format!("cannot open {}", path.display()))?;
    let reader = BufReader::new(file);

    let mut name = path
        .file_stem()
        .map(|s| s.to_string_lossy().to_string())
        .unwrap_or_else(|| "problem".to_string());
    let mut obj_sense = ObjSense::Minimize;
    let mut obj_offset = 0.0;

    let mut rows: Vec<RawRow> = Vec::new();
    let mut row_map: HashMap<String, usize> = HashMap::new();
    let mut obj_row: Option<String> = None;

    let mut cols: Vec<RawCol> = Vec::new();
    let mut col_map: HashMap<String, usize> = HashMap::new();

    let mut section = String::new();
    let mut in_integer_block = false;

    for line in reader.lines() {
        let raw = line?;
        let line = raw.trim_end();
        if line.is_empty() || line.starts_with('*') {
            continue;
        }

        // Section headers start in column one.
        if !raw.starts_with(' ') && !raw.starts_with('\t') {
            let mut parts = line.split_whitespace();
            let header = parts.next().unwrap_or("");
            match header {
                "NAME" => {
                    if let Some(n) = parts.next() {
                        name = n.to_string();
                    }
                    section.clear();
                }
                "OBJSENSE" => {
                    // the sense may follow on the same line or the next one
                    if let Some(s) = parts.next() {
                        obj_sense = parse_objsense(s)?;
                        section.clear();
                    } else {
                        section = "OBJSENSE".to_string();
                    }
                }
                "ROWS" | "COLUMNS" | "RHS" | "RANGES" | "BOUNDS" => {
                    section = header.to_string();
                }
                "ENDATA" => break,
                other => bail!("unsupported MPS section {:?}", other),
            }
            continue;
        }

        let parts: Vec<&str> = line.split_whitespace().collect();
        match section.as_str() {
            "OBJSENSE" => {
                obj_sense = parse_objsense(parts[0])?;
                section.clear();
            }
            "ROWS" => {
                if parts.len() < 2 {
                    bail!("malformed ROWS line: {:?}", line);
                }
                let kind = match parts[0].to_ascii_uppercase().as_str() {
                    "N" => RowKind::Objective,
                    "L" => RowKind::Le,
                    "G" => RowKind::Ge,
                    "E" => RowKind::Eq,
                    other => bail!("unknown row type {:?}", other),
                };
                let rname = parts[1].to_string();
                if kind == RowKind::Objective {
                    if obj_row.is_none() {
                        obj_row = Some(rname);
                    }
                    // further free rows are ignored
                    continue;
                }
                row_map.insert(rname.clone(), rows.len());
                rows.push(RawRow {
                    name: rname,
                    kind,
                    entries: Vec::new(),
                    rhs: 0.0,
                    range: None,
                });
            }
            "COLUMNS" => {
                // integrality markers
                if parts.len() >= 3 && parts[1].trim_matches('\'') == "MARKER" {
                    match parts[2].trim_matches('\'') {
                        "INTORG" => in_integer_block = true,
                        "INTEND" => in_integer_block = false,
                        other => bail!("unknown marker {:?}", other),
                    }
                    continue;
                }
                if parts.len() < 3 {
                    bail!("malformed COLUMNS line: {:?}", line);
                }
                let cname = parts[0];
                let j = *col_map.entry(cname.to_string()).or_insert_with(|| {
                    cols.push(RawCol {
                        name: cname.to_string(),
                        integer: in_integer_block,
                        lb: 0.0,
                        ub: f64::INFINITY,
                        lb_set: false,
                        ub_set: false,
                        binary: false,
                        obj: 0.0,
                    });
                    cols.len() - 1
                });

                let mut k = 1;
                while k + 1 < parts.len() {
                    let rname = parts[k];
                    let value: f64 = parts[k + 1]
                        .parse()
                        .with_context(|| format!("bad coefficient {:?}", parts[k + 1]))?;
                    if Some(rname) == obj_row.as_deref() {
                        cols[j].obj = value;
                    } else {
                        let row = *row_map
                            .get(rname)
                            .ok_or_else(|| anyhow!("unknown row {:?}", rname))?;
                        rows[row].entries.push((j, value));
                    }
                    k += 2;
                }
            }
            "RHS" => {
                // first field is the RHS vector name
                let mut k = 1;
                while k + 1 < parts.len() {
                    let rname = parts[k];
                    let value: f64 = parts[k + 1]
                        .parse()
                        .with_context(|| format!("bad rhs {:?}", parts[k + 1]))?;
                    if Some(rname) == obj_row.as_deref() {
                        // objective rhs is a negated constant offset
                        obj_offset = -value;
                    } else {
                        let row = *row_map
                            .get(rname)
                            .ok_or_else(|| anyhow!("unknown row {:?}", rname))?;
                        rows[row].rhs = value;
                    }
                    k += 2;
                }
            }
            "RANGES" => {
                let mut k = 1;
                while k + 1 < parts.len() {
                    let rname = parts[k];
                    let value: f64 = parts[k + 1]
                        .parse()
                        .with_context(|| format!("bad range {:?}", parts[k + 1]))?;
                    let row = *row_map
                        .get(rname)
                        .ok_or_else(|| anyhow!("unknown row {:?}", rname))?;
                    rows[row].range = Some(value);
                    k += 2;
                }
            }
            "BOUNDS" => {
                if parts.len() < 3 {
                    bail!("malformed BOUNDS line: {:?}", line);
                }
                let btype = parts[0].to_ascii_uppercase();
                let cname = parts[2];
                let j = *col_map
                    .get(cname)
                    .ok_or_else(|| anyhow!("bound on unknown column {:?}", cname))?;
                let value = || -> Result<f64> {
                    parts
                        .get(3)
                        .ok_or_else(|| anyhow!("bound {:?} needs a value", btype))?
                        .parse()
                        .map_err(|_| anyhow!("bad bound value {:?}", parts[3]))
                };
                match btype.as_str() {
                    "UP" => {
                        cols[j].ub = value()?;
                        cols[j].ub_set = true;
                    }
                    "LO" => {
                        cols[j].lb = value()?;
                        cols[j].lb_set = true;
                    }
                    "FX" => {
                        let v = value()?;
                        cols[j].lb = v;
                        cols[j].ub = v;
                        cols[j].lb_set = true;
                        cols[j].ub_set = true;
                    }
                    "FR" => {
                        cols[j].lb = f64::NEG_INFINITY;
                        cols[j].ub = f64::INFINITY;
                        cols[j].lb_set = true;
                        cols[j].ub_set = true;
                    }
                    "MI" => {
                        cols[j].lb = f64::NEG_INFINITY;
                        cols[j].lb_set = true;
                    }
                    "PL" => {
                        cols[j].ub = f64::INFINITY;
                        cols[j].ub_set = true;
                    }
                    "BV" => {
                        cols[j].integer = true;
                        cols[j].binary = true;
                        cols[j].lb = 0.0;
                        cols[j].ub = 1.0;
                        cols[j].lb_set = true;
                        cols[j].ub_set = true;
                    }
                    "UI" => {
                        cols[j].integer = true;
                        cols[j].ub = value()?;
                        cols[j].ub_set = true;
                    }
                    "LI" => {
                        cols[j].integer = true;
                        cols[j].lb = value()?;
                        cols[j].lb_set = true;
                    }
                    other => bail!("unknown bound type {:?}", other),
                }
            }
            "" => bail!("data line outside any section: {:?}", line),
            other => bail!("unhandled section {:?}", other),
        }
    }

    if obj_row.is_none() {
        bail!("MPS file has no objective (N) row");
    }

    // Assemble the model. Integer columns with [0, 1] bounds are binaries.
    let mut builder = ModelBuilder::new(name);
    builder.obj_sense(obj_sense);
    builder.obj_offset(obj_offset);
    for col in &cols {
        let ty = if col.binary || (col.integer && col.lb == 0.0 && col.ub == 1.0) {
            VarType::Binary
        } else if col.integer {
            VarType::Integer
        } else {
            VarType::Continuous
        };
        builder.add_col(col.name.clone(), ty, col.lb, col.ub, col.obj);
    }
    for row in &rows {
        let (sense, rhs, range) = match (row.kind, row.range) {
            (RowKind::Le, None) => (RowSense::Le, row.rhs, 0.0),
            (RowKind::Ge, None) => (RowSense::Ge, row.rhs, 0.0),
            (RowKind::Eq, None) => (RowSense::Eq, row.rhs, 0.0),
            // normalize every ranged row to [rhs - range, rhs]
            (RowKind::Le, Some(r)) => (RowSense::Range, row.rhs, r.abs()),
            (RowKind::Ge, Some(r)) => (RowSense::Range, row.rhs + r.abs(), r.abs()),
            (RowKind::Eq, Some(r)) => {
                if r >= 0.0 {
                    (RowSense::Range, row.rhs + r, r)
                } else {
                    (RowSense::Range, row.rhs, -r)
                }
            }
            (RowKind::Objective, _) => continue,
        };
        builder.add_row(row.name.clone(), &row.entries, sense, rhs, range);
    }

    builder
        .build()
        .map_err(|e| anyhow!("invalid problem: {}", e))
}

fn parse_objsense(s: &str) -> Result<ObjSense> {
    match s.to_ascii_uppercase().as_str() {
        "MIN" | "MINIMIZE" => Ok(ObjSense::Minimize),
        "MAX" | "MAXIMIZE" => Ok(ObjSense::Maximize),
        other => bail!("unknown objective sense {:?}", other),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn parse_str(content: &str) -> Result<ModelData> {
        use std::sync::atomic::{AtomicUsize, Ordering};
        static COUNTER: AtomicUsize = AtomicUsize::new(0);
        let unique = COUNTER.fetch_add(1, Ordering::Relaxed);
        let mut path = std::env::temp_dir();
        path.push(format!(
            "pump-mps-test-{}-{}.mps",
            std::process::id(),
            unique
        ));
        let mut f = File::create(&path).unwrap();
        f.write_all(content.as_bytes()).unwrap();
        let result = parse_mps(&path);
        std::fs::remove_file(&path).ok();
        result
    }

    #[test]
    fn test_parse_small_mip() {
        let data = parse_str(
            "NAME          COVER\n\
             ROWS\n\
             N  COST\n\
             G  C1\n\
             L  C2\n\
             COLUMNS\n\
                 MARKER                 'MARKER'                 'INTORG'\n\
                 X0        COST      1.0        C1        1.0\n\
                 X0        C2        1.0\n\
                 X1        COST      1.0        C1        1.0\n\
                 MARKER                 'MARKER'                 'INTEND'\n\
                 Y         COST      0.5        C2        2.0\n\
             RHS\n\
                 RHS       C1        1.0        C2        3.0\n\
             BOUNDS\n\
              UP BND       X0        1.0\n\
              UP BND       X1        1.0\n\
              UP BND       Y         5.0\n\
             ENDATA\n",
        )
        .unwrap();

        assert_eq!(data.ncols(), 3);
        assert_eq!(data.nrows(), 2);
        assert_eq!(data.col_type(0), VarType::Binary);
        assert_eq!(data.col_type(1), VarType::Binary);
        assert_eq!(data.col_type(2), VarType::Continuous);
        assert_eq!(data.obj_coef(2), 0.5);
        assert_eq!(data.row_sense(0), RowSense::Ge);
        assert_eq!(data.row_rhs(1), 3.0);
        assert_eq!(data.ub(2), 5.0);
    }

    #[test]
    fn test_ranged_row_normalization() {
        // G row with range 2 and rhs 1: feasible set [1, 3] -> rhs 3, range 2
        let data = parse_str(
            "NAME R\n\
             ROWS\n\
             N  OBJ\n\
             G  C1\n\
             COLUMNS\n\
                 X         OBJ       1.0        C1        1.0\n\
             RHS\n\
                 RHS       C1        1.0\n\
             RANGES\n\
                 RNG       C1        2.0\n\
             ENDATA\n",
        )
        .unwrap();

        assert_eq!(data.row_sense(0), RowSense::Range);
        let (lo, hi) = data.row_bounds(0);
        assert_eq!(lo, 1.0);
        assert_eq!(hi, 3.0);
    }

    #[test]
    fn test_objective_offset_and_sense() {
        let data = parse_str(
            "NAME O\n\
             OBJSENSE\n\
                 MAX\n\
             ROWS\n\
             N  OBJ\n\
             L  C1\n\
             COLUMNS\n\
                 X         OBJ       2.0        C1        1.0\n\
             RHS\n\
                 RHS       C1        4.0        OBJ       -1.5\n\
             ENDATA\n",
        )
        .unwrap();

        assert_eq!(data.obj_sense(), ObjSense::Maximize);
        assert_eq!(data.obj_offset(), 1.5);
    }

    #[test]
    fn test_bv_bound() {
        let data = parse_str(
            "NAME B\n\
             ROWS\n\
             N  OBJ\n\
             G  C1\n\
             COLUMNS\n\
                 X         OBJ       1.0        C1        1.0\n\
             RHS\n\
                 RHS       C1        1.0\n\
             BOUNDS\n\
              BV BND       X\n\
             ENDATA\n",
        )
        .unwrap();

        assert_eq!(data.col_type(0), VarType::Binary);
        assert_eq!(data.ub(0), 1.0);
    }

    #[test]
    fn test_missing_objective_rejected() {
        let result = parse_str(
            "NAME X\n\
             ROWS\n\
             G  C1\n\
             ENDATA\n",
        );
        assert!(result.is_err());
    }
}
