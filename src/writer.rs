use log::info;
use std::collections::BTreeMap;
use std::fs::{self};
use std::path::{Path, PathBuf};

use crate::stack::App;
use crate::template::{self, Format, Template};

#[derive(thiserror::Error, Debug, PartialEq)]
pub enum Error {
    #[error("Unable to write {0}: {1}")]
    WriteError(String, String),

    #[error(transparent)]
    TemplateError(#[from] template::Error),
}

#[derive(Debug, Clone, PartialEq)]
pub struct OutputSettings {
    pub directory: PathBuf,
    pub format: Format,
}

impl Default for OutputSettings {
    fn default() -> Self {
        return Self {
            directory: PathBuf::from("cdk.out"),
            format: Format::Json,
        };
    }
}

/// Renders every stack of `app` into `<directory>/<stack id>.template.<ext>`.
pub fn synth(app: &App, settings: &OutputSettings) -> Result<Vec<PathBuf>, Error> {
    if let Err(error) = fs::create_dir_all(&settings.directory) {
        return Err(Error::WriteError(
            settings.directory.display().to_string(),
            error.to_string(),
        ));
    }

    let mut written = vec![];
    for stack in app.stacks() {
        let template = Template::from_stack(stack)?;
        let contents = template.render(settings.format)?;

        let file_name = format!("{}.template.{}", stack.id, settings.format.extension());
        let path = settings.directory.join(file_name);
        write_file(&path, &contents)?;

        info!("Synthesized stack {} to {}", stack.id, path.display());
        written.push(path);
    }

    return Ok(written);
}

pub fn write_outputs(path: &Path, outputs: &BTreeMap<String, String>) -> Result<(), Error> {
    let file_contents = match serde_json::to_string_pretty(outputs) {
        Ok(contents) => contents,
        Err(error) => {
            return Err(Error::WriteError(
                path.display().to_string(),
                error.to_string(),
            ))
        }
    };

    write_file(path, &file_contents)?;
    info!("Wrote {} output(s) to {}", outputs.len(), path.display());
    return Ok(());
}

fn write_file(path: &Path, contents: &str) -> Result<(), Error> {
    match fs::write(path, contents) {
        Ok(_) => Ok(()),
        Err(error) => Err(Error::WriteError(
            path.display().to_string(),
            error.to_string(),
        )),
    }
}
