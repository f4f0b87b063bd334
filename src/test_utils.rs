//! Fixtures and helpers shared by unit and integration tests

pub mod fixtures {
    use std::io::{Cursor, Write};
    use std::sync::Arc;

    use tempfile::NamedTempFile;
    use tiff::encoder::{TiffEncoder, colortype};

    use crate::page::{
        DecodeError, DeclaredSize, DecodedPage, PageDescriptor, PageFields, PageImage, Raster,
    };

    /// Deterministic RGBA8 pattern, distinct per pixel position
    pub fn rgba_gradient(width: u32, height: u32) -> Vec<u8> {
        let mut data = Vec::with_capacity((width * height * 4) as usize);
        for y in 0..height {
            for x in 0..width {
                data.extend_from_slice(&[
                    (x % 256) as u8,
                    (y % 256) as u8,
                    ((x + y) % 256) as u8,
                    255,
                ]);
            }
        }
        data
    }

    /// Multi-page TIFF bytes; page i is an RGBA8 `rgba_gradient` of `sizes[i]`
    pub fn tiff_container(sizes: &[(u32, u32)]) -> Vec<u8> {
        let mut cursor = Cursor::new(Vec::new());
        {
            let mut encoder = TiffEncoder::new(&mut cursor).expect("tiff encoder");
            for &(width, height) in sizes {
                encoder
                    .write_image::<colortype::RGBA8>(width, height, &rgba_gradient(width, height))
                    .expect("tiff page");
            }
        }
        cursor.into_inner()
    }

    /// `tiff_container` written to a temporary file
    pub fn tiff_file(sizes: &[(u32, u32)]) -> NamedTempFile {
        let mut file = tempfile::Builder::new()
            .suffix(".tif")
            .tempfile()
            .expect("temp file");
        file.write_all(&tiff_container(sizes)).expect("write tiff");
        file.flush().expect("flush tiff");
        file
    }

    /// In-memory page with a canned decode result
    pub struct FakePage {
        index: usize,
        decoded: Result<DecodedPage, String>,
    }

    impl FakePage {
        pub fn new(index: usize, declared: DeclaredSize, fields: PageFields, raster: Raster) -> Self {
            Self {
                index,
                decoded: Ok(DecodedPage {
                    declared,
                    fields,
                    raster,
                }),
            }
        }

        /// Well-formed RGBA8 page filled with `rgba_gradient`
        pub fn rgba(index: usize, width: u32, height: u32) -> Self {
            Self::new(
                index,
                DeclaredSize::new(i64::from(width), i64::from(height)),
                PageFields::default(),
                Raster::Rgba8(rgba_gradient(width, height)),
            )
        }

        /// Page whose decode always fails
        pub fn failing(index: usize) -> Self {
            Self {
                index,
                decoded: Err(format!("page {index} is corrupt")),
            }
        }

        pub fn into_descriptor(self) -> PageDescriptor {
            PageDescriptor::new(self.index, Arc::new(self))
        }
    }

    impl PageImage for FakePage {
        fn decode_image(&self) -> Result<DecodedPage, DecodeError> {
            self.decoded.clone().map_err(DecodeError::Malformed)
        }
    }
}

pub mod test_helpers {
    use crate::event_source::{Event, KeyCode, KeyModifiers, SimulatedEventSource};
    use ratatui::Terminal;
    use ratatui::backend::TestBackend;

    /// Builder for creating test scenarios with simulated user input
    #[derive(Default)]
    pub struct TestScenarioBuilder {
        events: Vec<Event>,
    }

    impl TestScenarioBuilder {
        pub fn new() -> Self {
            Self::default()
        }

        pub fn press_char(mut self, c: char) -> Self {
            self.events.push(SimulatedEventSource::char_key(c));
            self
        }

        pub fn press_key(mut self, code: KeyCode) -> Self {
            self.events
                .push(SimulatedEventSource::key_event(code, KeyModifiers::empty()));
            self
        }

        pub fn next_page(self) -> Self {
            self.press_char('n')
        }

        pub fn previous_page(self) -> Self {
            self.press_char('p')
        }

        pub fn zoom_in(self) -> Self {
            self.press_char('+')
        }

        pub fn toggle_magnifier(self) -> Self {
            self.press_char('m')
        }

        pub fn move_mouse(mut self, column: u16, row: u16) -> Self {
            self.events.push(SimulatedEventSource::mouse_move(column, row));
            self
        }

        pub fn scroll_down(mut self, column: u16, row: u16) -> Self {
            self.events.push(SimulatedEventSource::wheel_down(column, row));
            self
        }

        pub fn click(mut self, column: u16, row: u16) -> Self {
            self.events.push(SimulatedEventSource::left_click(column, row));
            self
        }

        /// Quit the application (press 'q')
        pub fn quit(self) -> Self {
            self.press_char('q')
        }

        pub fn build(self) -> SimulatedEventSource {
            SimulatedEventSource::new(self.events)
        }
    }

    /// Create a test terminal for snapshot testing
    pub fn create_test_terminal(width: u16, height: u16) -> Terminal<TestBackend> {
        let backend = TestBackend::new(width, height);
        Terminal::new(backend).expect("test terminal")
    }

    /// Capture the current terminal buffer as a string
    pub fn capture_terminal_state(terminal: &Terminal<TestBackend>) -> String {
        let buffer = terminal.backend().buffer();
        let mut lines = Vec::new();

        for y in 0..buffer.area.height {
            let mut line = String::new();
            for x in 0..buffer.area.width {
                line.push_str(buffer[(x, y)].symbol());
            }
            lines.push(line.trim_end().to_string());
        }

        while lines.last().is_some_and(|l| l.is_empty()) {
            lines.pop();
        }

        lines.join("\n")
    }
}

#[cfg(test)]
mod tests {
    use super::fixtures::*;
    use super::test_helpers::*;

    #[test]
    fn test_scenario_builder() {
        let scenario = TestScenarioBuilder::new()
            .next_page()
            .zoom_in()
            .move_mouse(10, 5)
            .click(10, 5)
            .quit()
            .build();
        assert_eq!(scenario.events.len(), 5);
    }

    #[test]
    fn gradient_has_four_bytes_per_pixel() {
        let data = rgba_gradient(3, 2);
        assert_eq!(data.len(), 24);
        assert_eq!(&data[4..8], &[1, 0, 1, 255]);
    }

    #[test]
    fn tiff_container_starts_with_a_tiff_header() {
        let bytes = tiff_container(&[(2, 2)]);
        assert!(bytes.starts_with(b"II*\0") || bytes.starts_with(b"MM\0*"));
    }
}
