#![forbid(unsafe_code)]

#[cfg(test)]
mod recording;


#[cfg(test)]
mod presets;
