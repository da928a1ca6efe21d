use lopdf::content::Operation;
use lopdf::{Object, StringFormat};
use std::{collections::BTreeMap, io::BufWriter, mem};
use time::OffsetDateTime;

use crate::canvas::{Canvas, Color, Rect, TextStyle};
use crate::error::ContextError;
use crate::font::{encode_win_ansi, StandardFont};

/// The low-level image representation for a PDF document. The pixels are always stored as 8-bit RGB,
/// transparent images are flattened onto a white background beforehand.
#[derive(Debug, Clone)]
pub struct ImageXObject {
    /// Width of the image in pixels.
    pub width: u32,
    /// Height of the image in pixels.
    pub height: u32,
    /// The raw RGB samples, row by row.
    pub image_data: Vec<u8>,
}

impl ImageXObject {
    /// Decodes an encoded (PNG or JPEG) image into its RGB samples.
    pub fn from_encoded(encoded_image: &[u8]) -> Result<Self, ContextError> {
        let image = image::load_from_memory(encoded_image)
            .map_err(|error| ContextError::with_error("Failed to decode the image", &error))?
            .to_rgba8();
        let (width, height) = image.dimensions();

        let mut image_data = Vec::with_capacity((width * height * 3) as usize);
        for pixel in image.pixels() {
            let [red, green, blue, alpha] = pixel.0;
            // Blend every channel with white according to the opacity of the pixel
            for channel in [red, green, blue] {
                let blended = (u32::from(channel) * u32::from(alpha)
                    + 255 * (255 - u32::from(alpha)))
                    / 255;
                image_data.push(blended as u8);
            }
        }

        Ok(ImageXObject {
            width,
            height,
            image_data,
        })
    }
}

impl From<ImageXObject> for lopdf::Stream {
    fn from(value: ImageXObject) -> Self {
        use lopdf::Object::*;
        let dictionary = lopdf::Dictionary::from_iter(vec![
            ("Type", Name("XObject".into())),
            ("Subtype", Name("Image".into())),
            ("Width", Integer(i64::from(value.width))),
            ("Height", Integer(i64::from(value.height))),
            ("ColorSpace", Name("DeviceRGB".into())),
            ("BitsPerComponent", Integer(8)),
        ]);
        lopdf::Stream::new(dictionary, value.image_data)
    }
}

/// Named reference to an `XObject`.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub struct XObjectReference(String);

impl XObjectReference {
    /// Creates a new reference for an `XObject` from a number.
    pub fn new(index: usize) -> Self {
        Self(format!("X{index}"))
    }
}

/// The association between the names of the images used on a page and the images themselves.
#[derive(Default, Debug, Clone)]
pub struct XObjectMap(BTreeMap<XObjectReference, ImageXObject>);

impl XObjectMap {
    /// Inserts the `XObject`s into the document, simultaneously constructing a PDF dictionary of them.
    pub fn into_with_document(&self, document: &mut lopdf::Document) -> lopdf::Dictionary {
        self.0
            .iter()
            .map(|(name, image)| {
                let stream: lopdf::Stream = image.clone().into();
                let object_reference = document.add_object(stream);
                (name.0.clone(), lopdf::Object::Reference(object_reference))
            })
            .collect()
    }
}

/// Struct for storing the PDF Resources, to be used on a PDF page.
#[derive(Default, Debug, Clone)]
pub(crate) struct PdfResources {
    /// External graphics objects.
    pub xobjects: XObjectMap,
}

impl PdfResources {
    /// Inserts the resources into the document, simultaneously constructing a PDF dictionary of them.
    /// The fonts are shared by all the pages, so only a reference to their dictionary is stored.
    pub(crate) fn with_document(
        &self,
        inner_document: &mut lopdf::Document,
        fonts_dictionary_id: lopdf::ObjectId,
    ) -> lopdf::Dictionary {
        let mut dictionary = lopdf::Dictionary::new();
        dictionary.set("Font", lopdf::Object::Reference(fonts_dictionary_id));

        let xobjects_dictionary = self.xobjects.into_with_document(inner_document);
        if !xobjects_dictionary.is_empty() {
            dictionary.set("XObject", lopdf::Object::Dictionary(xobjects_dictionary));
        }

        dictionary
    }
}

/// The representation of a PDF page, holding the content operations drawn onto it so far.
#[derive(Debug, Clone)]
pub struct PdfPage {
    /// The number of the page in the document, starting from 1.
    pub(crate) number: usize,
    /// Page width in points.
    pub width: f32,
    /// Page height in points.
    pub height: f32,
    /// The content stream operations of the page.
    pub operations: Vec<Operation>,
    /// Resources used in this page.
    pub(crate) resources: PdfResources,
}

/// Converts millimeters to points. This function is used in order to present the data
/// in the format required by the PDF specification, while the layout works in millimeters.
fn millimeters_to_points(millimeters: f32) -> f32 {
    millimeters * 2.834646
}

/// The entries of the document information dictionary.
#[derive(Debug, Clone)]
pub struct DocumentInformation {
    pub title: String,
    pub author: String,
    pub subject: String,
    pub creator: String,
    pub creation_date: OffsetDateTime,
}

impl Default for DocumentInformation {
    fn default() -> Self {
        DocumentInformation {
            title: "Untitled".into(),
            author: "Unknown".into(),
            subject: String::new(),
            creator: concat!("reportr ", env!("CARGO_PKG_VERSION")).into(),
            creation_date: OffsetDateTime::UNIX_EPOCH,
        }
    }
}

/// This struct represents the actual PDF document on a high-level. It is an interface to the actual underlying
/// `lopdf::Document` with the addition of the PDF pages and the document ID.
///
/// Drawing happens through the `Canvas` implementation, which always targets the last page. The
/// content is only turned into PDF objects by `write_all`, after which `save_to_bytes` serializes it.
pub struct PdfDocument {
    /// The underlying PDF document: this is a low-level interface and shouldn't be directly interacted with
    /// unless strictly necessary, anyway this is why it is exposed to the user.
    pub inner_document: lopdf::Document,
    /// The identifier of the document, it is used to in order to set the PDF `ID` tag.
    pub identifier: String,
    /// The entries of the information dictionary.
    pub information: DocumentInformation,
    /// The pages of the PDF document.
    pub(crate) pages: Vec<PdfPage>,
    /// Page width in millimeters.
    page_width: f32,
    /// Page height in millimeters.
    page_height: f32,
    /// The number of images registered so far, used for naming them uniquely.
    image_count: usize,
    /// Whether `write_all` has already turned the pages into PDF objects.
    written: bool,
}

impl PdfDocument {
    /// Create a new `PdfDocument` with a first empty page of the given size in millimeters,
    /// defaulting the underlying PDF document to version 1.5 of the PDF specification.
    pub fn new(identifier: String, page_width: f32, page_height: f32) -> Self {
        let mut pdf_document = PdfDocument {
            inner_document: lopdf::Document::with_version("1.5"),
            identifier,
            information: DocumentInformation::default(),
            pages: Vec::new(),
            page_width,
            page_height,
            image_count: 0,
            written: false,
        };
        pdf_document.add_page();
        pdf_document
    }

    /// Write the pages drawn so far into the underlying PDF document and finalize it.
    /// The instance ID is the second half of the PDF `ID` tag.
    pub fn write_all(&mut self, instance_id: String) -> Result<(), ContextError> {
        use lopdf::Object::*;
        use lopdf::StringFormat::*;

        if self.written {
            return Err(ContextError::with_context(
                "The PDF document has already been written",
            ));
        }

        let creation_date = to_pdf_timestamp_format(&self.information.creation_date);
        let document_info = lopdf::Dictionary::from_iter(vec![
            ("Trapped", "False".into()),
            (
                "CreationDate",
                String(creation_date.clone().into_bytes(), Literal),
            ),
            ("ModDate", String(creation_date.into_bytes(), Literal)),
            ("Title", String(encode_win_ansi(&self.information.title), Literal)),
            (
                "Author",
                String(encode_win_ansi(&self.information.author), Literal),
            ),
            (
                "Creator",
                String(encode_win_ansi(&self.information.creator), Literal),
            ),
            (
                "Producer",
                String(self.information.creator.clone().into_bytes(), Literal),
            ),
            (
                "Subject",
                String(encode_win_ansi(&self.information.subject), Literal),
            ),
            (
                "Identifier",
                String(self.identifier.clone().into_bytes(), Literal),
            ),
        ]);
        let document_info_id = self.inner_document.add_object(Dictionary(document_info));

        // Construct the catalog, required by the PDF specification
        let pages_id = self.inner_document.new_object_id();
        let catalog = lopdf::Dictionary::from_iter(vec![
            ("Type", "Catalog".into()),
            ("PageLayout", "OneColumn".into()),
            ("PageMode", "UseNone".into()),
            ("Pages", Reference(pages_id)),
        ]);
        let catalog_id = self.inner_document.add_object(catalog);

        let mut pages = lopdf::Dictionary::from_iter(vec![
            ("Type", "Pages".into()),
            ("Count", Integer(self.pages.len() as i64)),
        ]);

        self.inner_document
            .trailer
            .set("Root", Reference(catalog_id));
        self.inner_document
            .trailer
            .set("Info", Reference(document_info_id));
        self.inner_document.trailer.set(
            "ID",
            Array(vec![
                String(self.identifier.clone().into_bytes(), Literal),
                String(instance_id.into_bytes(), Literal),
            ]),
        );

        let fonts_dictionary = self.insert_fonts_into_document();
        let fonts_dictionary_id = self.inner_document.add_object(fonts_dictionary);

        let mut page_ids = Vec::<lopdf::Object>::new();
        for page in self.pages.iter_mut() {
            let media_box: lopdf::Object =
                vec![0.into(), 0.into(), page.width.into(), page.height.into()].into();
            let mut page_dictionary = lopdf::Dictionary::from_iter(vec![
                ("Type", "Page".into()),
                ("Rotate", Integer(0)),
                ("MediaBox", media_box.clone()),
                ("TrimBox", media_box.clone()),
                ("CropBox", media_box),
                ("Parent", Reference(pages_id)),
            ]);

            let resource_dictionary = page
                .resources
                .with_document(&mut self.inner_document, fonts_dictionary_id);
            let resources_page_id = self
                .inner_document
                .add_object(Dictionary(resource_dictionary));
            page_dictionary.set("Resources", Reference(resources_page_id));

            let content = lopdf::content::Content {
                operations: mem::take(&mut page.operations),
            };
            let encoded_content = content.encode().map_err(|error| {
                ContextError::with_error(
                    format!("Failed to encode the content of page {}", page.number),
                    &error,
                )
            })?;
            let content_id = self
                .inner_document
                .add_object(lopdf::Stream::new(lopdf::Dictionary::new(), encoded_content));
            page_dictionary.set("Contents", Reference(content_id));

            let page_id = self.inner_document.add_object(page_dictionary);
            page_ids.push(Reference(page_id))
        }

        // Use all the collected page references in order to set the "Kids" field of the PDF document
        // and then insert the pages dictionary into the document itself as a last operation
        pages.set::<_, lopdf::Object>("Kids".to_string(), page_ids.into());
        self.inner_document
            .objects
            .insert(pages_id, Dictionary(pages));
        self.written = true;

        log::debug!(
            "Wrote {} pages into the PDF document {:?}",
            self.pages.len(),
            self.identifier
        );

        Ok(())
    }

    /// Optimize the PDF document (only superficially).
    pub fn optimize(&mut self) {
        self.inner_document.prune_objects();
        self.inner_document.compress();
    }

    /// Save the `PdfDocument` to bytes in order for it to be written to a file or further processed.
    pub fn save_to_bytes(&mut self) -> Result<Vec<u8>, ContextError> {
        let mut pdf_document_bytes = Vec::new();
        let mut writer = BufWriter::new(&mut pdf_document_bytes);
        self.inner_document.save_to(&mut writer).map_err(|error| {
            ContextError::with_error("Error while saving the PDF document to bytes", &error)
        })?;
        mem::drop(writer);

        Ok(pdf_document_bytes)
    }

    /// Registers the standard fonts into the document and returns the dictionary naming them.
    fn insert_fonts_into_document(&mut self) -> lopdf::Dictionary {
        use lopdf::Object::*;
        let mut font_dictionary = lopdf::Dictionary::new();

        for font in StandardFont::ALL {
            let font_id = self
                .inner_document
                .add_object(lopdf::Dictionary::from_iter(vec![
                    ("Type", Name("Font".into())),
                    ("Subtype", Name("Type1".into())),
                    ("BaseFont", Name(font.base_font_name().into())),
                    ("Encoding", Name("WinAnsiEncoding".into())),
                ]));
            font_dictionary.set(font.resource_name(), Reference(font_id));
        }

        font_dictionary
    }

    /// This function is responsible for adding the given operations to the page currently being drawn.
    fn add_operations_to_current_page(
        &mut self,
        operations: Vec<Operation>,
    ) -> Result<(), ContextError> {
        let pdf_page = self.current_page()?;
        pdf_page.operations.extend(operations);

        Ok(())
    }

    fn current_page(&mut self) -> Result<&mut PdfPage, ContextError> {
        if self.written {
            return Err(ContextError::with_context(
                "Unable to draw onto a PDF document which has already been written",
            ));
        }
        self.pages
            .last_mut()
            .ok_or(ContextError::with_context("Failed to find the current page"))
    }

    /// Converts a point from millimeters measured from the top left corner into PDF user space.
    fn to_user_space(&self, x: f32, y: f32) -> (lopdf::Object, lopdf::Object) {
        (
            millimeters_to_points(x).into(),
            millimeters_to_points(self.page_height - y).into(),
        )
    }

    /// The operands of the `re` operator for a rectangle given from its top left corner.
    fn rectangle_operands(&self, rect: Rect) -> Vec<lopdf::Object> {
        let (x, y) = self.to_user_space(rect.x, rect.y + rect.height);
        vec![
            x,
            y,
            millimeters_to_points(rect.width).into(),
            millimeters_to_points(rect.height).into(),
        ]
    }
}

fn color_operands(color: Color) -> Vec<lopdf::Object> {
    color
        .to_fractions()
        .into_iter()
        .map(lopdf::Object::Real)
        .collect()
}

impl Canvas for PdfDocument {
    fn page_size(&self) -> (f32, f32) {
        (self.page_width, self.page_height)
    }

    fn page_count(&self) -> usize {
        self.pages.len()
    }

    fn add_page(&mut self) {
        self.pages.push(PdfPage {
            number: self.pages.len() + 1,
            width: millimeters_to_points(self.page_width),
            height: millimeters_to_points(self.page_height),
            operations: Vec::new(),
            resources: PdfResources::default(),
        });
    }

    fn fill_rect(&mut self, rect: Rect, color: Color) -> Result<(), ContextError> {
        let operations = vec![
            Operation::new("q", vec![]),
            Operation::new("rg", color_operands(color)),
            Operation::new("re", self.rectangle_operands(rect)),
            Operation::new("f", vec![]),
            Operation::new("Q", vec![]),
        ];
        self.add_operations_to_current_page(operations)
    }

    fn stroke_rect(
        &mut self,
        rect: Rect,
        color: Color,
        line_width: f32,
    ) -> Result<(), ContextError> {
        let operations = vec![
            Operation::new("q", vec![]),
            Operation::new("RG", color_operands(color)),
            Operation::new("w", vec![millimeters_to_points(line_width).into()]),
            Operation::new("re", self.rectangle_operands(rect)),
            Operation::new("S", vec![]),
            Operation::new("Q", vec![]),
        ];
        self.add_operations_to_current_page(operations)
    }

    fn line(
        &mut self,
        from: (f32, f32),
        to: (f32, f32),
        color: Color,
        line_width: f32,
    ) -> Result<(), ContextError> {
        let (from_x, from_y) = self.to_user_space(from.0, from.1);
        let (to_x, to_y) = self.to_user_space(to.0, to.1);
        let operations = vec![
            Operation::new("q", vec![]),
            Operation::new("RG", color_operands(color)),
            Operation::new("w", vec![millimeters_to_points(line_width).into()]),
            Operation::new("m", vec![from_x, from_y]),
            Operation::new("l", vec![to_x, to_y]),
            Operation::new("S", vec![]),
            Operation::new("Q", vec![]),
        ];
        self.add_operations_to_current_page(operations)
    }

    fn fill_polygon(&mut self, points: &[(f32, f32)], color: Color) -> Result<(), ContextError> {
        let Some((first, rest)) = points.split_first() else {
            return Ok(());
        };

        let mut operations = vec![
            Operation::new("q", vec![]),
            Operation::new("rg", color_operands(color)),
        ];
        let (x, y) = self.to_user_space(first.0, first.1);
        operations.push(Operation::new("m", vec![x, y]));
        for point in rest {
            let (x, y) = self.to_user_space(point.0, point.1);
            operations.push(Operation::new("l", vec![x, y]));
        }
        operations.push(Operation::new("h", vec![]));
        operations.push(Operation::new("f", vec![]));
        operations.push(Operation::new("Q", vec![]));
        self.add_operations_to_current_page(operations)
    }

    fn text(&mut self, text: &str, x: f32, y: f32, style: &TextStyle) -> Result<(), ContextError> {
        let (x, y) = self.to_user_space(style.left_edge(text, x), y);
        let operations = vec![
            Operation::new("BT", vec![]), // Begin text section
            Operation::new(
                "Tf",
                vec![
                    Object::Name(style.font.resource_name().into()),
                    style.size.into(),
                ],
            ), // Set the font and the font size
            Operation::new("rg", color_operands(style.color)), // Set the filling color of the text
            Operation::new("Td", vec![x, y]), // Set the position of the baseline
            Operation::new(
                "Tj",
                vec![Object::String(
                    encode_win_ansi(text),
                    StringFormat::Hexadecimal,
                )],
            ),
            Operation::new("ET", vec![]),
        ];
        self.add_operations_to_current_page(operations)
    }

    fn image(&mut self, encoded_image: &[u8], rect: Rect) -> Result<(), ContextError> {
        let image = ImageXObject::from_encoded(encoded_image)?;
        let reference = XObjectReference::new(self.image_count);
        let (x, y) = self.to_user_space(rect.x, rect.y + rect.height);
        let operations = vec![
            Operation::new("q", vec![]),
            // Scale the unit square the image is painted into up to the rectangle
            Operation::new(
                "cm",
                vec![
                    millimeters_to_points(rect.width).into(),
                    0.into(),
                    0.into(),
                    millimeters_to_points(rect.height).into(),
                    x,
                    y,
                ],
            ),
            Operation::new("Do", vec![Object::Name(reference.0.clone().into_bytes())]),
            Operation::new("Q", vec![]),
        ];

        let pdf_page = self.current_page()?;
        pdf_page.resources.xobjects.0.insert(reference, image);
        pdf_page.operations.extend(operations);
        self.image_count += 1;

        Ok(())
    }
}

/// Formats the given time so that it matches what the PDF specification expects.
/// An example of it is the following: D:20170505150224+02'00'.
fn to_pdf_timestamp_format(date: &OffsetDateTime) -> String {
    let offset = date.offset();
    let offset_sign = if offset.is_negative() { '-' } else { '+' };
    format!(
        "D:{:04}{:02}{:02}{:02}{:02}{:02}{offset_sign}{:02}'{:02}'",
        date.year(),
        u8::from(date.month()),
        date.day(),
        date.hour(),
        date.minute(),
        date.second(),
        offset.whole_hours().abs(),
        offset.minutes_past_hour().abs(),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::font::StandardFont;

    fn one_pixel_png() -> Vec<u8> {
        let mut bytes = Vec::new();
        image::RgbaImage::from_pixel(1, 1, image::Rgba([255, 0, 0, 128]))
            .write_to(
                &mut std::io::Cursor::new(&mut bytes),
                image::ImageFormat::Png,
            )
            .unwrap();
        bytes
    }

    #[test]
    fn written_document_can_be_parsed_back() {
        let mut pdf_document = PdfDocument::new("0123456789abcdef0123456789abcdef".into(), 210.0, 297.0);
        pdf_document.information.title = "Daily FX Blotter".into();
        let style = TextStyle::new(StandardFont::HelveticaBold, 12.0, Color::BLACK);
        pdf_document
            .fill_rect(Rect::new(0.0, 0.0, 210.0, 40.0), Color(30, 58, 138))
            .unwrap();
        pdf_document.text("USD/NGN", 20.0, 30.0, &style).unwrap();
        pdf_document.image(&one_pixel_png(), Rect::new(20.0, 10.0, 10.0, 10.0)).unwrap();
        pdf_document.add_page();
        pdf_document
            .line((20.0, 280.0), (190.0, 280.0), Color::BLACK, 0.3)
            .unwrap();

        pdf_document.write_all("instance".into()).unwrap();
        let bytes = pdf_document.save_to_bytes().unwrap();

        let parsed = lopdf::Document::load_mem(&bytes).unwrap();
        assert_eq!(parsed.get_pages().len(), 2);
        assert!(pdf_document.text("late", 0.0, 0.0, &style).is_err());
        assert!(pdf_document.write_all("again".into()).is_err());
    }

    #[test]
    fn transparent_pixels_are_flattened_onto_white() {
        let image = ImageXObject::from_encoded(&one_pixel_png()).unwrap();
        assert_eq!((image.width, image.height), (1, 1));
        assert_eq!(image.image_data[0], 255);
        assert!(image.image_data[1] > 120 && image.image_data[1] < 135);
        assert!(ImageXObject::from_encoded(b"garbage").is_err());
    }

    #[test]
    fn pdf_timestamp() {
        let date = time::macros::datetime!(2026-01-31 17:05:09 +01:00);
        assert_eq!(to_pdf_timestamp_format(&date), "D:20260131170509+01'00'");
    }
}
