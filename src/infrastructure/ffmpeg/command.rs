use std::path::{Path, PathBuf};

#[derive(Debug, Clone)]
struct Input {
    options: Vec<String>,
    source: String,
}

/// Argument list for a single ffmpeg invocation.
///
/// Inputs are numbered in insertion order, which is what filter graph labels such as
/// `[1:v]` refer to.
#[derive(Debug, Clone)]
pub struct FfmpegCommand {
    inputs: Vec<Input>,
    filter_graph: Option<String>,
    maps: Vec<String>,
    output_args: Vec<String>,
    output: PathBuf,
}

impl FfmpegCommand {
    pub fn new(output: impl Into<PathBuf>) -> Self {
        Self {
            inputs: Vec::new(),
            filter_graph: None,
            maps: Vec::new(),
            output_args: Vec::new(),
            output: output.into(),
        }
    }

    /// Adds an input and returns its index.
    pub fn input(&mut self, source: impl Into<String>, options: &[&str]) -> usize {
        self.inputs.push(Input {
            options: options.iter().map(|o| o.to_string()).collect(),
            source: source.into(),
        });
        self.inputs.len() - 1
    }

    pub fn input_path(&mut self, path: &Path, options: &[&str]) -> usize {
        self.input(path.to_string_lossy().to_string(), options)
    }

    pub fn filter_graph(&mut self, graph: impl Into<String>) -> &mut Self {
        self.filter_graph = Some(graph.into());
        self
    }

    pub fn map(&mut self, stream: impl Into<String>) -> &mut Self {
        self.maps.push(stream.into());
        self
    }

    pub fn output_args<I, S>(&mut self, args: I) -> &mut Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.output_args.extend(args.into_iter().map(Into::into));
        self
    }

    pub fn output(&self) -> &Path {
        &self.output
    }

    #[cfg(test)]
    pub fn input_count(&self) -> usize {
        self.inputs.len()
    }

    #[cfg(test)]
    pub fn input_sources(&self) -> impl Iterator<Item = &str> {
        self.inputs.iter().map(|i| i.source.as_str())
    }

    pub fn graph(&self) -> Option<&str> {
        self.filter_graph.as_deref()
    }

    #[cfg(test)]
    pub fn maps(&self) -> &[String] {
        &self.maps
    }

    /// Value following `flag` among the output arguments, e.g. `-t`.
    #[cfg(test)]
    pub fn output_arg(&self, flag: &str) -> Option<&str> {
        self.output_args
            .iter()
            .position(|a| a == flag)
            .and_then(|i| self.output_args.get(i + 1))
            .map(String::as_str)
    }

    pub fn args(&self) -> Vec<String> {
        let mut args = vec![
            "-hide_banner".to_string(),
            "-loglevel".to_string(),
            "error".to_string(),
            "-y".to_string(),
        ];

        for input in &self.inputs {
            args.extend(input.options.iter().cloned());
            args.push("-i".to_string());
            args.push(input.source.clone());
        }

        if let Some(graph) = &self.filter_graph {
            args.push("-filter_complex".to_string());
            args.push(graph.clone());
        }

        for map in &self.maps {
            args.push("-map".to_string());
            args.push(map.clone());
        }

        args.extend(self.output_args.iter().cloned());
        args.push(self.output.to_string_lossy().to_string());
        args
    }
}
