//! Inputs for placement runs: size presets, random generation, and the flat
//! `x y` pair file (existing points first, then candidates).

use crate::core::{Domain, PlacementError, Point, PointSet, Result};
use rand::Rng;
use std::fs::File;
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Problem sizes `n = m` of the benchmark presets, selected by 1-based index.
pub const PRESET_SIZES: [usize; 8] = [20, 30, 50, 75, 100, 125, 135, 150];

/// Size for preset `index`; unknown indices fall back to the smallest preset.
pub fn preset_size(index: usize) -> usize {
    index
        .checked_sub(1)
        .and_then(|i| PRESET_SIZES.get(i))
        .copied()
        .unwrap_or(PRESET_SIZES[0])
}

#[derive(Clone, Debug, PartialEq)]
pub struct Dataset {
    pub existing: PointSet,
    pub candidates: PointSet,
}

impl Dataset {
    /// `n` existing and `m` candidate points drawn uniformly from `domain`.
    pub fn random<R: Rng + ?Sized>(rng: &mut R, n: usize, m: usize, domain: &Domain) -> Self {
        let existing = random_points(rng, n, domain);
        let candidates = random_points(rng, m, domain);
        Self {
            existing,
            candidates,
        }
    }

    /// Conventional file name for an `n`/`m` dataset.
    pub fn file_name(n: usize, m: usize) -> String {
        format!("dataset_n{n}_m{m}.txt")
    }

    /// Read `n` existing then `m` candidate pairs of whitespace separated numbers.
    pub fn read<R: BufRead>(reader: R, n: usize, m: usize) -> Result<Self> {
        let needed = 2 * (n + m);
        let mut values = Vec::with_capacity(needed);

        'lines: for (idx, line) in reader.lines().enumerate() {
            let line = line?;
            for token in line.split_whitespace() {
                let value: f64 = token.parse().map_err(|_| PlacementError::Parse {
                    line: idx + 1,
                    message: format!("'{token}' is not a number"),
                })?;
                values.push(value);
                if values.len() == needed {
                    break 'lines;
                }
            }
        }

        if values.len() < needed {
            return Err(PlacementError::Truncated {
                expected: needed,
                found: values.len(),
            });
        }

        let (head, tail) = values.split_at(2 * n);
        Ok(Self {
            existing: pairs(head),
            candidates: pairs(tail),
        })
    }

    /// Write existing then candidate pairs, one `x y` pair per line.
    pub fn write<W: Write>(&self, mut writer: W) -> Result<()> {
        for p in self.existing.iter().chain(self.candidates.iter()) {
            writeln!(writer, "{} {}", p.x, p.y)?;
        }
        writer.flush()?;
        Ok(())
    }

    pub fn load(path: &Path, n: usize, m: usize) -> Result<Self> {
        let file = File::open(path)?;
        Self::read(BufReader::new(file), n, m)
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        let file = File::create(path)?;
        self.write(BufWriter::new(file))
    }

    /// Load `dir/dataset_n{n}_m{m}.txt`, or generate and save it when missing.
    pub fn load_or_generate<R: Rng + ?Sized>(
        dir: &Path,
        n: usize,
        m: usize,
        domain: &Domain,
        rng: &mut R,
    ) -> Result<(Self, PathBuf)> {
        let path = dir.join(Self::file_name(n, m));
        if path.exists() {
            debug!(path = %path.display(), "reading dataset");
            return Ok((Self::load(&path, n, m)?, path));
        }

        info!(path = %path.display(), n, m, "dataset missing, generating");
        let dataset = Self::random(rng, n, m, domain);
        dataset.save(&path)?;
        Ok((dataset, path))
    }
}

fn random_points<R: Rng + ?Sized>(rng: &mut R, count: usize, domain: &Domain) -> PointSet {
    PointSet::from_points((0..count).map(|_| {
        Point::new(
            rng.gen_range(domain.min_x..=domain.max_x),
            rng.gen_range(domain.min_y..=domain.max_y),
        )
    }))
}

fn pairs(values: &[f64]) -> PointSet {
    PointSet::from_points(values.chunks_exact(2).map(|c| Point::new(c[0], c[1])))
}
