pub mod floatie;
pub mod ytdlp;
