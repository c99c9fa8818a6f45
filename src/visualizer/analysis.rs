// Analysis graph: context + analyser + media source, built lazily on the
// first play and reused afterwards. Sample buffers are reallocated only when
// the analyser's resolution changes.

use tracing::debug;

use crate::host::audio::{
    AnalyserNode, AudioContext, AudioHost, ContextState, SourceNode, DEFAULT_FFT_SIZE,
};
use crate::host::media::SharedMedia;

#[derive(Default)]
pub struct AnalysisGraph {
    context: Option<Box<dyn AudioContext>>,
    analyser: Option<Box<dyn AnalyserNode>>,
    source: Option<Box<dyn SourceNode>>,
    frequency: Vec<u8>,
    time_domain: Vec<u8>,
}

impl AnalysisGraph {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build whatever is missing and make sure the buffers match the
    /// analyser. Returns `false` when the host cannot provide the graph.
    pub fn ensure(&mut self, host: &dyn AudioHost, media: &SharedMedia, smoothing: f64) -> bool {
        if self.context.is_none() {
            match host.create_context() {
                Ok(context) => self.context = Some(context),
                Err(e) => {
                    debug!("visualizer unavailable: {e}");
                    return false;
                }
            }
        }
        let Some(context) = self.context.as_mut() else {
            return false;
        };

        if context.state() == ContextState::Suspended {
            if let Err(e) = context.resume() {
                debug!("audio context resume failed: {e}");
            }
        }

        if self.analyser.is_none() {
            let mut analyser = match context.create_analyser() {
                Ok(analyser) => analyser,
                Err(e) => {
                    debug!("analyser creation failed: {e}");
                    return false;
                }
            };
            analyser.set_fft_size(DEFAULT_FFT_SIZE);
            analyser.set_smoothing_time_constant(smoothing);

            if self.source.is_none() {
                match context.create_media_source(media) {
                    Ok(source) => self.source = Some(source),
                    Err(e) => {
                        debug!("media source creation failed: {e}");
                        return false;
                    }
                }
            }
            if let Some(source) = self.source.as_mut() {
                if !source.is_connected() {
                    if let Err(e) = source.connect(analyser.as_mut()) {
                        debug!("analyser connection failed: {e}");
                    }
                }
            }
            self.analyser = Some(analyser);
        }

        let Some(analyser) = self.analyser.as_mut() else {
            return false;
        };
        let bins = analyser.frequency_bin_count();
        if self.frequency.len() != bins {
            self.frequency = vec![0; bins];
        }
        let fft = analyser.fft_size();
        if self.time_domain.len() != fft {
            self.time_domain = vec![0; fft];
        }
        analyser.set_smoothing_time_constant(smoothing);
        true
    }

    pub fn is_ready(&self) -> bool {
        self.analyser.is_some()
    }

    pub fn set_smoothing(&mut self, smoothing: f64) {
        if let Some(analyser) = self.analyser.as_mut() {
            analyser.set_smoothing_time_constant(smoothing);
        }
    }

    /// Read fresh frequency data into the reused buffer.
    pub fn read_frequency(&mut self) -> Option<&[u8]> {
        let analyser = self.analyser.as_mut()?;
        analyser.byte_frequency_data(&mut self.frequency);
        Some(&self.frequency)
    }

    /// Read fresh time-domain data into the reused buffer.
    pub fn read_time_domain(&mut self) -> Option<&[u8]> {
        let analyser = self.analyser.as_mut()?;
        analyser.byte_time_domain_data(&mut self.time_domain);
        Some(&self.time_domain)
    }

    pub fn frequency_len(&self) -> usize {
        self.frequency.len()
    }

    pub fn time_domain_len(&self) -> usize {
        self.time_domain.len()
    }

    pub fn analyser(&self) -> Option<&dyn AnalyserNode> {
        self.analyser.as_deref()
    }
}
