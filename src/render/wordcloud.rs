// * Word Cloud
// * Exact token frequencies over the corpus, then a spiral layout rasterized with the bitmap font.
// * Placement is seeded but only the frequency mapping is meant to be reproducible.

use crate::config::constants::{
    RANDOM_SEED, WORDCLOUD_HEIGHT, WORDCLOUD_MAX_SCALE, WORDCLOUD_MAX_WORDS, WORDCLOUD_WIDTH,
};
use crate::refinery::normalizer::StopWords;
use crate::render::glyphs::{self, GLYPH_HEIGHT, GLYPH_SPACING, GLYPH_WIDTH};
use crate::render::RenderError;
use crate::topics::vocabulary::{Corpus, Vocabulary};
use image::{DynamicImage, ImageOutputFormat, Rgb, RgbImage};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::f64::consts::TAU;
use std::io::Cursor;
use tracing::debug;
use xxhash_rust::xxh64::xxh64;

// * Spiral search budget per word and scale
const SPIRAL_STEPS: usize = 4000;
const SPIRAL_STEP: f64 = 0.1;
const MARGIN: u32 = 1;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WordCloudConfig {
    pub width: u32,
    pub height: u32,
    pub max_words: usize,
    /// Glyph scale of the most frequent word
    pub max_scale: u32,
    pub background: [u8; 3],
    pub seed: u64,
}

impl Default for WordCloudConfig {
    fn default() -> Self {
        Self {
            width: WORDCLOUD_WIDTH,
            height: WORDCLOUD_HEIGHT,
            max_words: WORDCLOUD_MAX_WORDS,
            max_scale: WORDCLOUD_MAX_SCALE,
            background: [255, 255, 255],
            seed: RANDOM_SEED,
        }
    }
}

/// Sums every token's counts across documents, skipping stop words.
pub fn word_frequencies(
    corpus: &Corpus,
    vocabulary: &Vocabulary,
    stopwords: &StopWords,
) -> Result<BTreeMap<String, usize>, RenderError> {
    let mut frequencies = BTreeMap::new();

    for bow in corpus {
        for &(id, count) in bow {
            let token = vocabulary.token(id).ok_or_else(|| {
                RenderError::Mismatch(format!(
                    "term id {} outside vocabulary of {} terms",
                    id,
                    vocabulary.len()
                ))
            })?;
            if stopwords.contains(token) {
                continue;
            }
            *frequencies.entry(token.to_string()).or_insert(0) += count;
        }
    }

    Ok(frequencies)
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlacedWord {
    pub text: String,
    pub count: usize,
    pub x: u32,
    pub y: u32,
    pub scale: u32,
    pub color: [u8; 3],
}

impl PlacedWord {
    pub fn width(&self) -> u32 {
        glyphs::text_width(&self.text) * self.scale
    }

    pub fn height(&self) -> u32 {
        GLYPH_HEIGHT * self.scale
    }
}

/// A laid-out cloud, ready to rasterize
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WordCloud {
    pub width: u32,
    pub height: u32,
    pub background: [u8; 3],
    pub words: Vec<PlacedWord>,
}

// * Occupied pixels of the canvas
struct Occupancy {
    width: u32,
    height: u32,
    cells: Vec<bool>,
}

impl Occupancy {
    fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            cells: vec![false; (width as usize) * (height as usize)],
        }
    }

    fn is_free(&self, x: i64, y: i64, w: u32, h: u32) -> bool {
        let m = MARGIN as i64;
        if x < 0 || y < 0 || x + w as i64 > self.width as i64 || y + h as i64 > self.height as i64 {
            return false;
        }
        let x0 = (x - m).max(0) as u32;
        let y0 = (y - m).max(0) as u32;
        let x1 = ((x + w as i64 + m) as u32).min(self.width);
        let y1 = ((y + h as i64 + m) as u32).min(self.height);
        (y0..y1).all(|row| (x0..x1).all(|col| !self.cells[self.index(col, row)]))
    }

    fn fill(&mut self, x: u32, y: u32, w: u32, h: u32) {
        for row in y..(y + h).min(self.height) {
            for col in x..(x + w).min(self.width) {
                let i = self.index(col, row);
                self.cells[i] = true;
            }
        }
    }

    fn index(&self, col: u32, row: u32) -> usize {
        row as usize * self.width as usize + col as usize
    }
}

impl WordCloud {
    /// Most frequent words first; each word shrinks until it fits or is dropped.
    pub fn layout(frequencies: &BTreeMap<String, usize>, config: &WordCloudConfig) -> Self {
        let mut ranked: Vec<(&String, usize)> =
            frequencies.iter().map(|(w, &c)| (w, c)).filter(|(_, c)| *c > 0).collect();
        ranked.sort_by(|a, b| b.1.cmp(&a.1).then(a.0.cmp(b.0)));
        ranked.truncate(config.max_words);

        let mut rng = StdRng::seed_from_u64(config.seed);
        let mut occupancy = Occupancy::new(config.width, config.height);
        let mut words = Vec::new();
        let max_count = ranked.first().map(|(_, c)| *c).unwrap_or(1) as f64;

        for (text, count) in ranked {
            // * glyph cell area grows linearly with the count
            let ideal = config.max_scale as f64 * (count as f64 / max_count).sqrt();
            let start_scale = (ideal.round() as u32).clamp(1, config.max_scale.max(1));
            let offset = rng.gen_range(0.0..TAU);

            match place(&mut occupancy, text, start_scale, offset) {
                Some((x, y, scale)) => words.push(PlacedWord {
                    text: text.clone(),
                    count,
                    x,
                    y,
                    scale,
                    color: word_color(text),
                }),
                None => debug!(word = %text, "No room left in word cloud"),
            }
        }

        Self {
            width: config.width,
            height: config.height,
            background: config.background,
            words,
        }
    }

    pub fn rasterize(&self) -> RgbImage {
        let mut img = RgbImage::from_pixel(self.width, self.height, Rgb(self.background));

        for word in &self.words {
            let mut pen_x = word.x;
            for c in word.text.chars() {
                for row in 0..GLYPH_HEIGHT {
                    for col in 0..GLYPH_WIDTH {
                        if !glyphs::is_set(c, col, row) {
                            continue;
                        }
                        for dy in 0..word.scale {
                            for dx in 0..word.scale {
                                let px = pen_x + col * word.scale + dx;
                                let py = word.y + row * word.scale + dy;
                                if px < self.width && py < self.height {
                                    img.put_pixel(px, py, Rgb(word.color));
                                }
                            }
                        }
                    }
                }
                pen_x += (GLYPH_WIDTH + GLYPH_SPACING) * word.scale;
            }
        }

        img
    }

    pub fn to_png(&self) -> Result<Vec<u8>, RenderError> {
        let mut bytes = Vec::new();
        DynamicImage::ImageRgb8(self.rasterize())
            .write_to(&mut Cursor::new(&mut bytes), ImageOutputFormat::Png)?;
        Ok(bytes)
    }
}

fn place(occupancy: &mut Occupancy, text: &str, start_scale: u32, offset: f64) -> Option<(u32, u32, u32)> {
    let cx = occupancy.width as f64 / 2.0;
    let cy = occupancy.height as f64 / 2.0;
    // * wide canvases get a flatter spiral
    let aspect = occupancy.width as f64 / occupancy.height.max(1) as f64;

    for scale in (1..=start_scale).rev() {
        let w = glyphs::text_width(text) * scale;
        let h = GLYPH_HEIGHT * scale;
        if w == 0 || w > occupancy.width || h > occupancy.height {
            continue;
        }

        for step in 0..SPIRAL_STEPS {
            let t = step as f64 * SPIRAL_STEP;
            let x = cx + aspect * t * (t + offset).cos() - w as f64 / 2.0;
            let y = cy + t * (t + offset).sin() - h as f64 / 2.0;
            let (x, y) = (x.round() as i64, y.round() as i64);

            if occupancy.is_free(x, y, w, h) {
                let (x, y) = (x as u32, y as u32);
                occupancy.fill(x, y, w, h);
                return Some((x, y, scale));
            }
        }
    }

    None
}

// * Stable per-word colour, kept dark enough to read on white
fn word_color(text: &str) -> [u8; 3] {
    let hash = xxh64(text.as_bytes(), 0).to_le_bytes();
    [hash[0] % 160 + 20, hash[1] % 160 + 20, hash[2] % 160 + 20]
}

/// Frequencies plus the encoded raster
#[derive(Debug, Clone)]
pub struct WordCloudImage {
    pub frequencies: BTreeMap<String, usize>,
    pub cloud: WordCloud,
    pub png: Vec<u8>,
}

pub fn render_word_cloud(
    corpus: &Corpus,
    vocabulary: &Vocabulary,
    stopwords: &StopWords,
    config: &WordCloudConfig,
) -> Result<WordCloudImage, RenderError> {
    let frequencies = word_frequencies(corpus, vocabulary, stopwords)?;
    let cloud = WordCloud::layout(&frequencies, config);
    let png = cloud.to_png()?;

    debug!(
        distinct = frequencies.len(),
        placed = cloud.words.len(),
        bytes = png.len(),
        "Word cloud rendered"
    );

    Ok(WordCloudImage {
        frequencies,
        cloud,
        png,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn freqs(pairs: &[(&str, usize)]) -> BTreeMap<String, usize> {
        pairs.iter().map(|(w, c)| (w.to_string(), *c)).collect()
    }

    #[test]
    fn test_frequencies_skip_stopwords() {
        let docs = vec![
            vec!["pool".to_string(), "the".to_string()],
            vec!["pool".to_string(), "pool".to_string()],
        ];
        let vocab = Vocabulary::from_documents(&docs);
        let corpus = vocab.corpus(&docs);
        let result = word_frequencies(&corpus, &vocab, &StopWords::english()).unwrap();
        assert_eq!(result, freqs(&[("pool", 3)]));
    }

    #[test]
    fn test_unknown_term_is_mismatch() {
        let vocab = Vocabulary::from(vec!["pool".to_string()]);
        let corpus = vec![vec![(7, 1)]];
        assert!(matches!(
            word_frequencies(&corpus, &vocab, &StopWords::empty()),
            Err(RenderError::Mismatch(_))
        ));
    }

    #[test]
    fn test_layout_words_do_not_overlap() {
        let cloud = WordCloud::layout(
            &freqs(&[("pool", 10), ("staff", 6), ("beach", 3), ("view", 1)]),
            &WordCloudConfig::default(),
        );
        assert_eq!(cloud.words.len(), 4);
        assert_eq!(cloud.words[0].text, "pool");
        assert_eq!(cloud.words[0].scale, WORDCLOUD_MAX_SCALE);

        for (i, a) in cloud.words.iter().enumerate() {
            assert!(a.x + a.width() <= cloud.width && a.y + a.height() <= cloud.height);
            for b in &cloud.words[i + 1..] {
                let apart = a.x + a.width() <= b.x
                    || b.x + b.width() <= a.x
                    || a.y + a.height() <= b.y
                    || b.y + b.height() <= a.y;
                assert!(apart, "{} overlaps {}", a.text, b.text);
            }
        }
    }

    #[test]
    fn test_max_words_limit() {
        let config = WordCloudConfig {
            max_words: 2,
            ..WordCloudConfig::default()
        };
        let cloud = WordCloud::layout(&freqs(&[("a", 3), ("b", 2), ("c", 1)]), &config);
        let texts: Vec<&str> = cloud.words.iter().map(|w| w.text.as_str()).collect();
        assert_eq!(texts, vec!["a", "b"]);
    }

    #[test]
    fn test_png_signature() {
        let cloud = WordCloud::layout(&freqs(&[("pool", 2)]), &WordCloudConfig::default());
        let png = cloud.to_png().unwrap();
        assert_eq!(&png[..8], &[0x89, b'P', b'N', b'G', 0x0D, 0x0A, 0x1A, 0x0A]);
    }

    #[test]
    fn test_color_is_stable() {
        assert_eq!(word_color("pool"), word_color("pool"));
        assert!(word_color("pool").iter().all(|&c| (20..180).contains(&c)));
    }
}
