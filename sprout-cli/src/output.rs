use crate::{cli::OutputFormat, error::Result};
#[cfg(feature = "colored-output")]
use colored::*;
use sprout_parser::media::{FormatDescriptor, PlaybackDescriptor};
use std::borrow::Cow;
use std::io::Write;
#[cfg(feature = "table-output")]
use tabled::{Table, Tabled, settings::Style};

pub struct OutputManager {
    colored: bool,
}

impl OutputManager {
    pub fn new(colored: bool) -> Self {
        Self { colored }
    }

    pub fn format_descriptor(
        &self,
        descriptor: &PlaybackDescriptor,
        format: &OutputFormat,
        include_headers: bool,
    ) -> Result<String> {
        match format {
            OutputFormat::Pretty => Ok(self.format_pretty(descriptor, include_headers)),
            OutputFormat::Json => Self::format_json(descriptor, include_headers, true),
            OutputFormat::JsonCompact => Self::format_json(descriptor, include_headers, false),
            #[cfg(feature = "table-output")]
            OutputFormat::Table => Ok(Self::format_table(descriptor)),
            #[cfg(not(feature = "table-output"))]
            OutputFormat::Table => {
                // Fallback to pretty format when table feature is disabled
                Ok(self.format_pretty(descriptor, include_headers))
            }
            OutputFormat::Csv => Ok(Self::format_csv(descriptor)),
        }
    }

    pub fn format_embeds(&self, urls: &[String], format: &OutputFormat) -> Result<String> {
        let output = match format {
            OutputFormat::Json => serde_json::to_string_pretty(urls)? + "\n",
            OutputFormat::JsonCompact => serde_json::to_string(urls)? + "\n",
            OutputFormat::Csv => {
                let mut output = String::from("url\n");
                for url in urls {
                    output.push_str(&format!("\"{}\"\n", Self::escape_csv(url)));
                }
                output
            }
            OutputFormat::Pretty | OutputFormat::Table => {
                let mut output = self.colorize(
                    &format!("Found {} embed(s):", urls.len()),
                    &Color::Green,
                    true,
                );
                output.push('\n');
                for url in urls {
                    output.push_str(&format!("  {}\n", self.colorize(url, &Color::Blue, false)));
                }
                output
            }
        };
        Ok(output)
    }

    fn format_pretty(&self, descriptor: &PlaybackDescriptor, include_headers: bool) -> String {
        let mut output = String::new();

        output.push_str(&self.colorize("Video Information:", &Color::Green, true));
        output.push('\n');
        self.push_field(&mut output, "Id", &descriptor.id, &Color::Cyan);
        self.push_field(&mut output, "Title", &descriptor.title, &Color::Cyan);
        self.push_field(
            &mut output,
            "Formats",
            &descriptor.formats.len().to_string(),
            &Color::Cyan,
        );

        for format in &descriptor.formats {
            output.push('\n');
            output.push_str(&self.colorize(&format!("Format {}:", format.format_id), &Color::Green, true));
            output.push('\n');
            self.push_format(&mut output, format, include_headers);
        }

        output
    }

    fn push_format(&self, output: &mut String, format: &FormatDescriptor, include_headers: bool) {
        self.push_field(output, "Quality", &format.quality(), &Color::Cyan);
        self.push_field(output, "Ext", format.ext.as_str(), &Color::Cyan);
        self.push_field(output, "Protocol", format.protocol.as_str(), &Color::Cyan);
        if let Some(codecs) = &format.codecs {
            self.push_field(output, "Codecs", codecs, &Color::Cyan);
        }
        if let Some(fps) = format.fps {
            self.push_field(output, "FPS", &fps.to_string(), &Color::Cyan);
        }
        self.push_field(output, "URL", &format.url, &Color::Blue);
        if let Some(segment) = &format.extra_param_to_segment_url {
            self.push_field(output, "Segment Query", segment, &Color::Blue);
        }
        if let Some(key) = &format.extra_param_to_key_url {
            self.push_field(output, "Key Query", key, &Color::Blue);
        }

        if include_headers && !format.http_headers.is_empty() {
            output.push_str(&format!("  {}:\n", self.colorize("Headers", &Color::Yellow, false)));
            let mut headers: Vec<_> = format.http_headers.iter().collect();
            headers.sort();
            for (key, value) in headers {
                output.push_str(&format!(
                    "    {}: {}\n",
                    self.colorize(key, &Color::Green, false),
                    self.colorize(value, &Color::Cyan, false)
                ));
            }
        }
    }

    fn push_field(&self, output: &mut String, name: &str, value: &str, color: &Color) {
        output.push_str(&format!(
            "  {}: {}\n",
            self.colorize(name, &Color::Yellow, false),
            self.colorize(value, color, false)
        ));
    }

    fn format_json(
        descriptor: &PlaybackDescriptor,
        include_headers: bool,
        pretty: bool,
    ) -> Result<String> {
        let mut output = serde_json::to_value(descriptor)?;

        if !include_headers {
            if let Some(formats) = output["formats"].as_array_mut() {
                for format in formats {
                    if let Some(obj) = format.as_object_mut() {
                        obj.remove("http_headers");
                    }
                }
            }
        }

        let mut result = if pretty {
            serde_json::to_string_pretty(&output)?
        } else {
            serde_json::to_string(&output)?
        };
        result.push('\n');

        Ok(result)
    }

    #[cfg(feature = "table-output")]
    fn format_table(descriptor: &PlaybackDescriptor) -> String {
        #[derive(Tabled)]
        struct TableRow<'a> {
            format_id: &'a str,
            quality: String,
            codecs: &'a str,
            url: &'a str,
        }

        let rows = descriptor.formats.iter().map(|format| TableRow {
            format_id: &format.format_id,
            quality: format.quality(),
            codecs: format.codecs.as_deref().unwrap_or(""),
            url: &format.url,
        });

        let table = Table::new(rows).with(Style::modern()).to_string();
        format!("{} ({})\n{}\n", descriptor.title, descriptor.id, table)
    }

    fn format_csv(descriptor: &PlaybackDescriptor) -> String {
        let mut output = String::new();
        output.push_str("id,title,format_id,width,height,tbr,codecs,url,segment_query,key_query\n");

        for format in &descriptor.formats {
            output.push_str(&format!(
                "\"{}\",\"{}\",\"{}\",{},{},{},\"{}\",\"{}\",\"{}\",\"{}\"\n",
                Self::escape_csv(&descriptor.id),
                Self::escape_csv(&descriptor.title),
                Self::escape_csv(&format.format_id),
                format.width.map(|w| w.to_string()).unwrap_or_default(),
                format.height.map(|h| h.to_string()).unwrap_or_default(),
                format.tbr.map(|t| t.to_string()).unwrap_or_default(),
                Self::escape_csv(format.codecs.as_deref().unwrap_or("")),
                Self::escape_csv(&format.url),
                Self::escape_csv(format.extra_param_to_segment_url.as_deref().unwrap_or("")),
                Self::escape_csv(format.extra_param_to_key_url.as_deref().unwrap_or("")),
            ));
        }

        output
    }

    // Helper method to avoid unnecessary allocations when escaping CSV
    fn escape_csv(s: &str) -> Cow<'_, str> {
        if s.contains('"') {
            Cow::Owned(s.replace('"', "\"\""))
        } else {
            Cow::Borrowed(s)
        }
    }

    fn colorize(&self, text: &str, color: &Color, bold: bool) -> String {
        #[cfg(feature = "colored-output")]
        {
            if self.colored {
                let colored_text = match color {
                    Color::Green => text.green(),
                    Color::Yellow => text.yellow(),
                    Color::Blue => text.blue(),
                    Color::Cyan => text.cyan(),
                };
                if bold {
                    colored_text.bold().to_string()
                } else {
                    colored_text.to_string()
                }
            } else {
                text.to_string()
            }
        }

        #[cfg(not(feature = "colored-output"))]
        {
            let _ = (self.colored, color, bold);
            text.to_string()
        }
    }
}

enum Color {
    Green,
    Yellow,
    Blue,
    Cyan,
}

pub fn write_output(content: &str, output_file: Option<&std::path::Path>) -> Result<()> {
    match output_file {
        Some(path) => {
            if let Some(parent) = path.parent() {
                std::fs::create_dir_all(parent)?;
            }
            std::fs::write(path, content)?;
        }
        None => {
            print!("{content}");
            std::io::stdout().flush()?;
        }
    }
    Ok(())
}
