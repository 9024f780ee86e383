//! Assembly of the "anexo fotográfico" DOCX.
//!
//! The document has two sections:
//!
//! 1. A photo grid with `AnnexLayout::columns` fixed-width cells per row.
//!    Cell `i` is captioned `[i+1]` and holds the servidor's photo when it
//!    can be loaded.
//! 2. After a page break, a reference table (`Número`, `Nome`, `MASP`) whose
//!    `Número` column is the same ordinal used in the grid captions. Every
//!    cell of that table carries explicit single-line borders.
//!
//! Assembly happens in two steps. `plan` resolves photos and ordinals into an
//! `AnnexPlan` (where photo problems become `PhotoWarning`s), and `render`
//! turns the plan into DOCX bytes.

use super::photo::{prepare_photo, PreparedPhoto};
use crate::error::{AppError, Result};
use common::model::servidor::Servidor;
use common::model::warning::{PhotoProblem, PhotoWarning};
use docx_rs::{
    AlignmentType, BorderType, BreakType, Docx, Paragraph, Pic, Run, Style, StyleType, Table,
    TableCell, TableCellBorder, TableCellBorderPosition, TableLayoutType, TableRow, WidthType,
};
use log::warn;
use std::io::Cursor;
use std::path::Path;

pub const DOCX_MIME: &str =
    "application/vnd.openxmlformats-officedocument.wordprocessingml.document";
pub const DOWNLOAD_NAME: &str = "anexo_fotografico.docx";

const EMU_PER_INCH: f64 = 914_400.0;
const TWIPS_PER_INCH: f64 = 1_440.0;

const TITLE_STYLE: &str = "Title";
const PHOTO_SECTION_TITLE: &str = "Anexo Fotográfico";
const REFERENCE_SECTION_TITLE: &str = "Lista de Referência";
const REFERENCE_HEADER: [&str; 3] = ["Número", "Nome", "MASP"];

/// Geometry and styling of the annex.
#[derive(Debug, Clone)]
pub struct AnnexLayout {
    pub columns: usize,
    /// Width every photo is scaled to, in inches.
    pub photo_width_in: f64,
    /// Width of every grid cell, in inches, independent of its content.
    pub cell_width_in: f64,
    /// Reference table border width in eighths of a point.
    pub border_size: usize,
    pub header_font_pt: usize,
}

impl Default for AnnexLayout {
    fn default() -> Self {
        AnnexLayout {
            columns: 4,
            photo_width_in: 1.5,
            cell_width_in: 1.5,
            border_size: 4,
            header_font_pt: 12,
        }
    }
}

impl AnnexLayout {
    fn photo_width_emu(&self) -> u32 {
        (self.photo_width_in * EMU_PER_INCH).round() as u32
    }

    fn cell_width_twips(&self) -> usize {
        (self.cell_width_in * TWIPS_PER_INCH).round() as usize
    }
}

/// One occupied cell of the photo grid.
#[derive(Debug, Clone)]
pub struct PhotoCell {
    /// 1-based position in the annex.
    pub ordinal: usize,
    pub photo: Option<PreparedPhoto>,
}

impl PhotoCell {
    pub fn caption(&self) -> String {
        format!("[{}]", self.ordinal)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReferenceRow {
    pub numero: usize,
    pub nome: String,
    pub masp: String,
}

/// Everything needed to render the annex, with photos already loaded.
#[derive(Debug, Clone)]
pub struct AnnexPlan {
    /// `ceil(n / columns)` rows; trailing cells of the last row are `None`.
    pub grid: Vec<Vec<Option<PhotoCell>>>,
    pub reference: Vec<ReferenceRow>,
    pub warnings: Vec<PhotoWarning>,
}

impl AnnexPlan {
    /// The reference table as text, header row first.
    pub fn reference_table(&self) -> Vec<[String; 3]> {
        let header = REFERENCE_HEADER.map(str::to_string);
        std::iter::once(header)
            .chain(
                self.reference
                    .iter()
                    .map(|r| [r.numero.to_string(), r.nome.clone(), r.masp.clone()]),
            )
            .collect()
    }
}

/// The rendered annex and the photo problems met while building it.
#[derive(Debug)]
pub struct Annex {
    pub bytes: Vec<u8>,
    pub warnings: Vec<PhotoWarning>,
}

/// Builds the complete annex for `servidores`, in the given order.
///
/// Photo problems never abort assembly: the document is produced even if no
/// photo at all could be embedded.
pub fn assemble(servidores: &[Servidor], layout: &AnnexLayout) -> Result<Annex> {
    let plan = plan(servidores, layout);
    let bytes = render(&plan, layout)?;
    Ok(Annex {
        bytes,
        warnings: plan.warnings,
    })
}

pub fn plan(servidores: &[Servidor], layout: &AnnexLayout) -> AnnexPlan {
    let columns = layout.columns.max(1);
    let mut warnings = Vec::new();

    let cells: Vec<PhotoCell> = servidores
        .iter()
        .enumerate()
        .map(|(i, servidor)| {
            let ordinal = i + 1;
            let photo = match load_photo(servidor, layout) {
                Ok(photo) => Some(photo),
                Err(reason) => {
                    let warning = PhotoWarning {
                        ordinal,
                        masp: servidor.masp.clone(),
                        nome: servidor.nome.clone(),
                        reason,
                    };
                    warn!("{}", warning);
                    warnings.push(warning);
                    None
                }
            };
            PhotoCell { ordinal, photo }
        })
        .collect();

    let grid = cells
        .chunks(columns)
        .map(|row| {
            let mut row: Vec<Option<PhotoCell>> = row.iter().cloned().map(Some).collect();
            row.resize(columns, None);
            row
        })
        .collect();

    let reference = servidores
        .iter()
        .enumerate()
        .map(|(i, s)| ReferenceRow {
            numero: i + 1,
            nome: s.nome.clone(),
            masp: s.masp.clone(),
        })
        .collect();

    AnnexPlan {
        grid,
        reference,
        warnings,
    }
}

fn load_photo(
    servidor: &Servidor,
    layout: &AnnexLayout,
) -> std::result::Result<PreparedPhoto, PhotoProblem> {
    if servidor.foto.trim().is_empty() {
        return Err(PhotoProblem::NoPhoto);
    }
    let path = Path::new(&servidor.foto);
    if !path.exists() {
        return Err(PhotoProblem::FileNotFound(servidor.foto.clone()));
    }
    prepare_photo(path, layout.photo_width_in)
        .map_err(|e| PhotoProblem::EmbedFailed(e.to_string()))
}

/// Renders a plan into DOCX bytes.
pub fn render(plan: &AnnexPlan, layout: &AnnexLayout) -> Result<Vec<u8>> {
    let title_style = Style::new(TITLE_STYLE, StyleType::Paragraph)
        .name(TITLE_STYLE)
        .size(56)
        .bold();

    let docx = Docx::new()
        .add_style(title_style)
        .add_paragraph(title(PHOTO_SECTION_TITLE))
        .add_table(photo_grid(plan, layout))
        .add_paragraph(Paragraph::new().add_run(Run::new().add_break(BreakType::Page)))
        .add_paragraph(title(REFERENCE_SECTION_TITLE))
        .add_table(reference_table(plan, layout));

    let mut out = Cursor::new(Vec::new());
    docx.build()
        .pack(&mut out)
        .map_err(|e| AppError::Internal(format!("could not write annex: {e}")))?;
    Ok(out.into_inner())
}

fn title(text: &str) -> Paragraph {
    Paragraph::new()
        .style(TITLE_STYLE)
        .add_run(Run::new().add_text(text))
}

fn centered(run: Run) -> Paragraph {
    Paragraph::new().align(AlignmentType::Center).add_run(run)
}

fn photo_grid(plan: &AnnexPlan, layout: &AnnexLayout) -> Table {
    let width = layout.cell_width_twips();
    let photo_width = layout.photo_width_emu();

    let rows = plan
        .grid
        .iter()
        .map(|row| {
            let cells = row
                .iter()
                .map(|cell| {
                    let mut table_cell = TableCell::new().width(width, WidthType::Dxa);
                    match cell {
                        Some(cell) => {
                            let caption = Run::new().add_text(cell.caption());
                            table_cell = table_cell.add_paragraph(centered(caption));
                            if let Some(photo) = &cell.photo {
                                let pic = Pic::new_with_dimensions(
                                    photo.png.clone(),
                                    photo.width_px,
                                    photo.height_px,
                                )
                                .size(photo_width, photo.height_for_width(photo_width));
                                table_cell =
                                    table_cell.add_paragraph(centered(Run::new().add_image(pic)));
                            }
                        }
                        // A cell needs at least one paragraph to be valid.
                        None => table_cell = table_cell.add_paragraph(Paragraph::new()),
                    }
                    table_cell
                })
                .collect();
            TableRow::new(cells)
        })
        .collect();

    Table::new(rows)
        .set_grid(vec![width; layout.columns.max(1)])
        .layout(TableLayoutType::Fixed)
}

fn reference_table(plan: &AnnexPlan, layout: &AnnexLayout) -> Table {
    let header_size = layout.header_font_pt * 2;
    let rows: Vec<Vec<TableCell>> = plan
        .reference_table()
        .into_iter()
        .enumerate()
        .map(|(i, texts)| {
            texts
                .into_iter()
                .map(|text| {
                    let mut run = Run::new().add_text(text);
                    if i == 0 {
                        run = run.bold().size(header_size);
                    }
                    TableCell::new().add_paragraph(Paragraph::new().add_run(run))
                })
                .collect()
        })
        .collect();

    apply_borders(rows, layout.border_size)
}

/// Builds a table from `rows`, giving every cell single black borders of
/// `size` on all four sides.
///
/// docx-rs tables are assembled by value, so the borders are applied to the
/// cells on their way into the table rather than to a finished table. They
/// are set per cell, not through the table style, so that viewers with poor
/// table-style support still draw them.
pub fn apply_borders(rows: Vec<Vec<TableCell>>, size: usize) -> Table {
    const SIDES: [TableCellBorderPosition; 4] = [
        TableCellBorderPosition::Top,
        TableCellBorderPosition::Left,
        TableCellBorderPosition::Bottom,
        TableCellBorderPosition::Right,
    ];

    let rows = rows
        .into_iter()
        .map(|cells| {
            let cells = cells
                .into_iter()
                .map(|cell| {
                    SIDES.into_iter().fold(cell, |cell, side| {
                        cell.set_border(
                            TableCellBorder::new(side)
                                .border_type(BorderType::Single)
                                .size(size)
                                .color("000000"),
                        )
                    })
                })
                .collect();
            TableRow::new(cells)
        })
        .collect();
    Table::new(rows)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::annex::photo::tests::write_test_png;
    use common::model::flag::Flag;
    use docx_rs::BuildXML;
    use tempfile::tempdir;

    fn servidor(id: i64, foto: &str) -> Servidor {
        Servidor {
            id,
            masp: format!("{}", 1000 + id),
            nome: format!("Servidor {id}"),
            sexo: "Masculino".to_string(),
            raca: "Parda".to_string(),
            foto: foto.to_string(),
            barba: Flag::Nao,
            careca: Flag::Nao,
        }
    }

    fn contains(haystack: &[u8], needle: &[u8]) -> bool {
        haystack.windows(needle.len()).any(|w| w == needle)
    }

    fn xml(table: &Table) -> String {
        String::from_utf8(table.build()).unwrap()
    }

    #[test]
    fn grid_and_reference_line_up() {
        let dir = tempdir().unwrap();
        let photo = dir.path().join("a.png");
        write_test_png(&photo, 30, 40);
        let photo = photo.to_string_lossy().to_string();

        let servidores: Vec<Servidor> = (1..=6).map(|id| servidor(id, &photo)).collect();
        let plan = plan(&servidores, &AnnexLayout::default());

        assert_eq!(plan.grid.len(), 2);
        assert!(plan.grid.iter().all(|row| row.len() == 4));
        assert!(plan.grid[1][2].is_none() && plan.grid[1][3].is_none());

        let table = plan.reference_table();
        assert_eq!(table.len(), 7);
        assert_eq!(table[0], ["Número", "Nome", "MASP"].map(str::to_string));

        let ordinals: Vec<usize> = plan
            .grid
            .iter()
            .flatten()
            .flatten()
            .map(|c| c.ordinal)
            .collect();
        assert_eq!(ordinals, vec![1, 2, 3, 4, 5, 6]);
        for (ordinal, row) in ordinals.iter().zip(&table[1..]) {
            assert_eq!(row[0], ordinal.to_string());
        }
        assert_eq!(table[3][1], "Servidor 3");
        assert_eq!(table[3][2], "1003");
        assert!(plan.warnings.is_empty());
        assert!(plan.grid[0][0].as_ref().unwrap().photo.is_some());
        assert_eq!(plan.grid[0][0].as_ref().unwrap().caption(), "[1]");
    }

    #[test]
    fn row_count_is_ceiling_of_n_over_columns() {
        let layout = AnnexLayout::default();
        for (n, rows) in [(0, 0), (1, 1), (4, 1), (5, 2), (8, 2), (9, 3)] {
            let servidores: Vec<Servidor> = (1..=n).map(|id| servidor(id, "")).collect();
            let plan = plan(&servidores, &layout);
            assert_eq!(plan.grid.len(), rows, "n = {n}");
            assert_eq!(plan.reference_table().len(), n as usize + 1);
        }
    }

    #[test]
    fn missing_photo_gives_one_warning_and_keeps_the_ordinal() {
        let dir = tempdir().unwrap();
        let good = dir.path().join("good.png");
        write_test_png(&good, 10, 10);
        let missing = dir.path().join("missing.jpg");

        let servidores = vec![
            servidor(1, &good.to_string_lossy()),
            servidor(2, &missing.to_string_lossy()),
            servidor(3, &good.to_string_lossy()),
        ];
        let plan = plan(&servidores, &AnnexLayout::default());

        assert_eq!(plan.warnings.len(), 1);
        assert_eq!(plan.warnings[0].ordinal, 2);
        assert_eq!(plan.warnings[0].masp, "1002");
        assert!(matches!(plan.warnings[0].reason, PhotoProblem::FileNotFound(_)));

        let row = &plan.grid[0];
        assert_eq!(row[1].as_ref().unwrap().ordinal, 2);
        assert!(row[1].as_ref().unwrap().photo.is_none());
        assert_eq!(row[2].as_ref().unwrap().ordinal, 3);
        assert_eq!(plan.reference.len(), 3);
    }

    #[test]
    fn each_kind_of_photo_problem_is_reported() {
        let dir = tempdir().unwrap();
        let corrupt = dir.path().join("corrupt.png");
        std::fs::write(&corrupt, b"nope").unwrap();

        let servidores = vec![servidor(1, ""), servidor(2, &corrupt.to_string_lossy())];
        let plan = plan(&servidores, &AnnexLayout::default());

        assert_eq!(plan.warnings.len(), 2);
        assert_eq!(plan.warnings[0].reason, PhotoProblem::NoPhoto);
        assert!(matches!(plan.warnings[1].reason, PhotoProblem::EmbedFailed(_)));
    }

    #[test]
    fn document_is_produced_even_when_every_photo_fails() {
        let servidores: Vec<Servidor> = (1..=5)
            .map(|id| servidor(id, "/definitely/not/here.jpg"))
            .collect();
        let annex = assemble(&servidores, &AnnexLayout::default()).unwrap();

        assert_eq!(annex.warnings.len(), 5);
        assert_eq!(&annex.bytes[..2], b"PK");
        assert!(contains(&annex.bytes, b"word/document.xml"));
    }

    #[test]
    fn document_with_photos_embeds_media() {
        let dir = tempdir().unwrap();
        let photo = dir.path().join("p.png");
        write_test_png(&photo, 60, 80);

        let with_photo = assemble(
            &[servidor(1, &photo.to_string_lossy())],
            &AnnexLayout::default(),
        )
        .unwrap();
        let without_photo = assemble(&[servidor(1, "")], &AnnexLayout::default()).unwrap();

        assert!(with_photo.warnings.is_empty());
        assert!(contains(&with_photo.bytes, b"word/media/"));
        assert!(!contains(&without_photo.bytes, b"word/media/"));
    }

    #[test]
    fn empty_selection_still_renders() {
        let annex = assemble(&[], &AnnexLayout::default()).unwrap();
        assert!(annex.warnings.is_empty());
        assert_eq!(&annex.bytes[..2], b"PK");
    }

    #[test]
    fn reference_table_has_bordered_cells_and_bold_header_only() {
        let layout = AnnexLayout::default();
        let servidores: Vec<Servidor> = (1..=5).map(|id| servidor(id, "")).collect();
        let xml = xml(&reference_table(&plan(&servidores, &layout), &layout));

        let rows: Vec<&str> = xml.split("</w:tr>").filter(|r| r.contains("<w:tc>")).collect();
        assert_eq!(rows.len(), 6);

        let borders: Vec<&str> = xml
            .split("<w:tcBorders>")
            .skip(1)
            .map(|b| b.split("</w:tcBorders>").next().unwrap())
            .collect();
        assert_eq!(borders.len(), 18);
        for cell in &borders {
            for side in ["<w:top ", "<w:left ", "<w:bottom ", "<w:right "] {
                assert!(cell.contains(side), "missing {side} in {cell}");
            }
        }

        assert_eq!(rows[0].matches("<w:b />").count(), 3);
        assert_eq!(rows[0].matches(r#"<w:sz w:val="24" />"#).count(), 3);
        assert!(rows[0].contains("Número"));
        for row in &rows[1..] {
            assert!(!row.contains("<w:b />"));
        }
        assert!(rows[5].contains("Servidor 5"));
    }

    #[test]
    fn photo_grid_renders_full_rows_with_captions() {
        let layout = AnnexLayout::default();
        let servidores: Vec<Servidor> = (1..=5).map(|id| servidor(id, "")).collect();
        let xml = xml(&photo_grid(&plan(&servidores, &layout), &layout));

        let rows: Vec<&str> = xml.split("</w:tr>").filter(|r| r.contains("<w:tc>")).collect();
        assert_eq!(rows.len(), 2);
        for row in &rows {
            assert_eq!(row.matches("</w:tc>").count(), 4);
        }
        for ordinal in 1..=5 {
            assert!(xml.contains(&format!("[{ordinal}]")));
        }
        assert!(rows[1].contains("[5]") && !rows[1].contains("[6]"));
    }
}
